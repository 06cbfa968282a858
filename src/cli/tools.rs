//! CLI entry-point for inspecting the tool schemas.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use crate::llm::tools;

/// Args for the `tools` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Only print this tool (`studies`, `study` or `drugLabeling`).
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: Args) -> Result<()> {
    let json = match args.name.as_deref() {
        Some(name) => {
            let tool = tools::lookup(name).with_context(|| format!("unknown tool `{name}`"))?;
            serde_json::to_string_pretty(tool)?
        }
        None => serde_json::to_string_pretty(tools::registry())?,
    };
    println!("{json}");
    Ok(())
}
