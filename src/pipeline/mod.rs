//! The search pipeline: question → tool call → search → results, graph, summary.
//!
//! A run is five sequential stages. Each reports progress through an [`Observer`] and
//! each can fail on its own; a failed stage ends the run except for the similarity
//! graph, whose failure is shown in place of the graph while the summary still runs.
//!
//! Each owner of a set of output regions (the terminal, one browser connection) hands
//! out tickets from its own [`Generation`]. Starting a run supersedes every earlier run
//! of the same owner: a superseded run stops at its next write instead of overwriting
//! output that now belongs to the newer search. An observer that stops listening
//! supersedes its run the same way.

pub mod similarity;
pub mod summarizer;
pub mod synthesizer;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

use crate::{
    config::Settings,
    data::{
        clinicaltrials::{self, CtGovClient},
        http_client,
        openfda::{self, OpenFdaClient},
        QueryParams, Record, Source,
    },
    error::{Error, Result},
    llm::{tools, ChatClient},
};

use self::similarity::{SimilarityClient, SimilarityGraph};

/// Output regions a run writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    SearchParams,
    Error,
    Documents,
    Network,
    Summary,
}

/// Something a run wants shown.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A new run began; earlier errors and summaries no longer apply.
    Started,
    /// A stage is waiting on a remote call.
    Progress { target: Target, text: &'static str },
    /// Query parameters parsed so far (repeated while the tool call streams).
    Params(QueryParams),
    /// The search returned; possibly with no records.
    Results(Arc<SearchOutcome>),
    Graph(SimilarityGraph),
    GraphError(String),
    /// Cumulative answer Markdown; `done` on the final event.
    Summary { markdown: String, done: bool },
    /// The run failed and stopped.
    Error(String),
}

impl PipelineEvent {
    pub fn target(&self) -> Target {
        match self {
            PipelineEvent::Started | PipelineEvent::Error(_) => Target::Error,
            PipelineEvent::Progress { target, .. } => *target,
            PipelineEvent::Params(_) => Target::SearchParams,
            PipelineEvent::Results(_) => Target::Documents,
            PipelineEvent::Graph(_) | PipelineEvent::GraphError(_) => Target::Network,
            PipelineEvent::Summary { .. } => Target::Summary,
        }
    }
}

/// Receives pipeline events as they happen.
pub trait Observer: Send {
    fn on_event(&mut self, event: PipelineEvent);

    /// `false` once nobody will see further events.
    fn is_listening(&self) -> bool {
        true
    }
}

impl Observer for Vec<PipelineEvent> {
    fn on_event(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

impl Observer for UnboundedSender<PipelineEvent> {
    fn on_event(&mut self, event: PipelineEvent) {
        // Send only fails once the receiver is gone, which `is_listening` reports.
        let _ = self.send(event);
    }

    fn is_listening(&self) -> bool {
        !UnboundedSender::is_closed(self)
    }
}

/// Source of run tickets. Cloning shares the counter.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Start a new generation, superseding every ticket issued before.
    pub fn begin(&self) -> Ticket {
        let id = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            id,
            counter: Arc::clone(&self.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    counter: Arc<AtomicU64>,
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.id
    }
}

/// One run's write handle: events only reach the observer while the ticket is current.
pub struct Run<'a> {
    ticket: Ticket,
    observer: &'a mut dyn Observer,
}

impl<'a> Run<'a> {
    pub fn new(ticket: Ticket, observer: &'a mut dyn Observer) -> Self {
        Self { ticket, observer }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Deliver `event`, or fail with [`Error::Superseded`] if a newer run has started or
    /// the observer went away.
    pub fn emit(&mut self, event: PipelineEvent) -> Result<()> {
        if !self.ticket.is_current() || !self.observer.is_listening() {
            return Err(Error::Superseded);
        }
        self.observer.on_event(event);
        Ok(())
    }
}

/// What the search stage returned. Shared read-only by every later stage.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub source: Source,
    /// Parameters as sent, after defaults and required fields were applied.
    pub params: QueryParams,
    pub records: Vec<Record>,
}

impl SearchOutcome {
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().filter_map(Record::id).collect()
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: Arc<SearchOutcome>,
    pub graph: Option<SimilarityGraph>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    chat: ChatClient,
    ctgov: CtGovClient,
    openfda: OpenFdaClient,
    similarity: SimilarityClient,
    generation: Generation,
    threshold: f64,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = http_client(settings)?;
        Ok(Self {
            chat: ChatClient::with_client(client.clone(), settings),
            ctgov: CtGovClient::with_client(client.clone(), settings),
            openfda: OpenFdaClient::with_client(client.clone(), settings),
            similarity: SimilarityClient::with_client(client, settings),
            generation: Generation::default(),
            threshold: settings.similarity_threshold,
        })
    }

    pub fn ctgov(&self) -> &CtGovClient {
        &self.ctgov
    }

    /// Run the whole pipeline for `question`, superseding the previous run started here.
    pub async fn run(
        &self,
        question: &str,
        source: Source,
        observer: &mut dyn Observer,
    ) -> Result<RunReport> {
        self.run_with(self.generation.begin(), question, source, observer)
            .await
    }

    /// Run the whole pipeline under `ticket`, which only runs from the same
    /// [`Generation`] can supersede.
    ///
    /// Failures are reported to `observer` as [`PipelineEvent::Error`] (unless the run
    /// was superseded) and returned.
    #[instrument(skip(self, ticket, observer), fields(generation = ticket.id()))]
    pub async fn run_with(
        &self,
        ticket: Ticket,
        question: &str,
        source: Source,
        observer: &mut dyn Observer,
    ) -> Result<RunReport> {
        let mut run = Run::new(ticket, observer);
        let result = self.stages(question, source, &mut run).await;
        if let Err(err) = &result {
            if err.is_reportable() {
                warn!(%err, "search failed");
                let _ = run.emit(PipelineEvent::Error(err.to_string()));
            } else {
                info!(generation = run.ticket().id(), "search superseded");
            }
        }
        result
    }

    async fn stages(&self, question: &str, source: Source, run: &mut Run<'_>) -> Result<RunReport> {
        info!(generation = run.ticket().id(), "search started");
        run.emit(PipelineEvent::Started)?;
        run.emit(PipelineEvent::Progress {
            target: Target::SearchParams,
            text: "Creating the search query...",
        })?;
        let params = synthesizer::synthesize(&self.chat, question, source, run).await?;
        tools::for_source(source).validate(&params)?;

        run.emit(PipelineEvent::Progress {
            target: Target::Documents,
            text: match source {
                Source::Studies => "Searching the Clinical Trials API...",
                Source::DrugLabeling => "Searching the openFDA drug label API...",
            },
        })?;
        let outcome = Arc::new(self.fetch(source, params).await?);
        run.emit(PipelineEvent::Results(Arc::clone(&outcome)))?;

        if outcome.records.is_empty() {
            info!("no records; skipping similarity and summary");
            return Ok(RunReport {
                outcome,
                graph: None,
                summary: None,
            });
        }

        run.emit(PipelineEvent::Progress {
            target: Target::Network,
            text: "Comparing results...",
        })?;
        let graph =
            match similarity::build_graph(&self.similarity, &outcome.records, self.threshold).await
            {
                Ok(graph) => {
                    if let Some(graph) = &graph {
                        run.emit(PipelineEvent::Graph(graph.clone()))?;
                    }
                    graph
                }
                Err(err) => {
                    warn!(%err, "similarity graph unavailable");
                    run.emit(PipelineEvent::GraphError(err.to_string()))?;
                    None
                }
            };

        run.emit(PipelineEvent::Progress {
            target: Target::Summary,
            text: "Finding the most relevant results to the question...",
        })?;
        let summary = summarizer::summarize(&self.chat, question, &outcome, run).await?;

        Ok(RunReport {
            outcome,
            graph,
            summary: Some(summary),
        })
    }

    async fn fetch(&self, source: Source, params: QueryParams) -> Result<SearchOutcome> {
        let (params, records) = match source {
            Source::Studies => {
                let page = self.ctgov.studies(&params).await?;
                (clinicaltrials::search_params(&params), page.into_records())
            }
            Source::DrugLabeling => {
                let page = self.openfda.drug_labeling(&params).await?;
                (openfda::label_params(&params), page.into_records())
            }
        };
        Ok(SearchOutcome {
            source,
            params,
            records,
        })
    }
}
