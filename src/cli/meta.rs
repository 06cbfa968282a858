//! CLI entry-point for the ClinicalTrials.gov metadata and statistics endpoints.

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, ValueEnum};
use serde_json::Value;
use tracing::instrument;

use crate::{
    config::Settings,
    data::{clinicaltrials::CtGovClient, QueryParams},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Endpoint {
    /// Data model of study records (`/studies/metadata`).
    Metadata,
    /// Search areas and their weights (`/studies/search-areas`).
    SearchAreas,
    /// Values of every enumeration type (`/studies/enums`).
    Enums,
    /// Study size statistics (`/stats/size`).
    Size,
    /// Value counts of leaf fields (`/stats/field/values`).
    FieldValues,
    /// List-size statistics of list fields (`/stats/field/sizes`).
    FieldSizes,
}

impl Endpoint {
    fn takes_params(self) -> bool {
        matches!(self, Endpoint::Size | Endpoint::FieldValues | Endpoint::FieldSizes)
    }
}

/// Args for the `meta` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[arg(value_enum)]
    pub endpoint: Endpoint,
    /// Fields to restrict statistics to (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
    /// Extra query parameters as key=value.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let mut params: QueryParams = args
        .params
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    if !args.fields.is_empty() {
        params.insert("fields", args.fields.clone());
    }
    if !params.is_empty() && !args.endpoint.takes_params() {
        bail!("{:?} does not accept query parameters", args.endpoint);
    }

    let client = CtGovClient::new(&settings)?;
    let body = match args.endpoint {
        Endpoint::Metadata => client.studies_metadata().await?,
        Endpoint::SearchAreas => client.search_areas().await?,
        Endpoint::Enums => client.enums().await?,
        Endpoint::Size => client.stats_size(&params).await?,
        Endpoint::FieldValues => client.field_values(&params).await?,
        Endpoint::FieldSizes => client.field_sizes(&params).await?,
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
