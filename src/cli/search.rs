//! CLI entry-point for a full question-to-answer search.

use std::{
    collections::HashSet,
    io::{self, Write},
};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::Source,
    pipeline::{Observer, Pipeline, PipelineEvent},
    render::{text, view},
};

/// Args for the `search` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// The question to answer.
    pub question: String,
    /// Collection to search.
    #[arg(long, value_enum, default_value_t = Source::Studies)]
    pub source: Source,
    /// Minimum similarity for linking two results (0-1).
    #[arg(long)]
    pub threshold: Option<f64>,
}

/// Prints pipeline output as it arrives.
///
/// Progress goes to stderr; parameters, results, graph and the answer go to stdout. The
/// answer streams cumulatively, so only the part not yet printed is written.
#[derive(Debug, Default)]
pub struct TerminalObserver {
    printed: usize,
}

impl TerminalObserver {
    fn print_summary(&mut self, markdown: &str, done: bool) {
        let mut out = io::stdout().lock();
        if self.printed == 0 && !markdown.is_empty() {
            let _ = writeln!(out, "\n## Answer\n");
        }
        // A stream that rewrote earlier text is reprinted in full.
        let fresh = match markdown.get(self.printed..) {
            Some(rest) => rest,
            None => {
                let _ = writeln!(out);
                markdown
            }
        };
        let _ = write!(out, "{fresh}");
        self.printed = markdown.len();
        if done {
            let _ = writeln!(out);
        }
        let _ = out.flush();
    }
}

impl Observer for TerminalObserver {
    fn on_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started | PipelineEvent::Params(_) => {}
            PipelineEvent::Progress { text, .. } => eprintln!("{text}"),
            PipelineEvent::Results(outcome) => {
                println!("## Query\n\n{}", text::params_table(&outcome.params));
                let results = view::results(outcome.source, &outcome.records, &HashSet::new());
                println!("## Results\n\n{}", text::results(&results));
            }
            PipelineEvent::Graph(graph) => println!("## Similar results\n\n{}", text::graph(&graph)),
            PipelineEvent::GraphError(message) => eprintln!("similarity unavailable: {message}"),
            PipelineEvent::Summary { markdown, done } => self.print_summary(&markdown, done),
            PipelineEvent::Error(message) => eprintln!("error: {message}"),
        }
    }
}

#[instrument(skip(settings))]
pub async fn run(args: Args, mut settings: Settings) -> Result<()> {
    if let Some(threshold) = args.threshold {
        settings.similarity_threshold = threshold;
    }
    let pipeline = Pipeline::new(&settings)?;
    let mut observer = TerminalObserver::default();
    let report = pipeline
        .run(&args.question, args.source, &mut observer)
        .await
        .with_context(|| format!("search {}", args.source.noun()))?;
    info!(
        records = report.outcome.records.len(),
        graphed = report.graph.is_some(),
        "search finished"
    );
    Ok(())
}
