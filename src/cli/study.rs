//! CLI entry-point for looking up one study.

use std::collections::HashSet;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    data::{clinicaltrials::CtGovClient, Record},
    render::{text, view},
};

/// Args for the `study` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// NCT identifier, e.g. NCT04280705.
    pub nct_id: String,
    /// Print the raw API response instead of a card.
    #[arg(long)]
    pub json: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let client = CtGovClient::new(&settings)?;
    let raw = client
        .study(&args.nct_id)
        .await
        .with_context(|| format!("fetch study {}", args.nct_id))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }
    let card = view::card(&Record::study(raw), &HashSet::new());
    print!("{}", text::card(&card));
    Ok(())
}
