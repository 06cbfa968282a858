//! Command-line interface wiring for trial-scope.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod meta;
pub mod search;
pub mod serve;
pub mod study;
pub mod tools;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Ask questions of ClinicalTrials.gov and OpenFDA drug labels",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Search(args) => search::run(args, settings).await,
            Commands::Study(args) => study::run(args, settings).await,
            Commands::Meta(args) => meta::run(args, settings).await,
            Commands::Tools(args) => tools::run(args),
            Commands::Serve(args) => serve::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Answer a question from trials or drug labels.
    Search(search::Args),
    /// Show a single study by NCT ID.
    Study(study::Args),
    /// Query ClinicalTrials.gov metadata and statistics endpoints.
    Meta(meta::Args),
    /// Print the tool schemas offered to the model.
    Tools(tools::Args),
    /// Serve the streaming search API and static UI.
    Serve(serve::Args),
}
