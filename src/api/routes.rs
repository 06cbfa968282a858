//! HTTP route handlers for Axum.

use std::{collections::HashSet, convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    api::types::{EdgesRequest, HtmlDto, RenderEvent, RenderRequest, SearchQuery},
    data::{Record, Source},
    error::Error,
    llm::{tools, ToolSpec},
    pipeline::{
        similarity::{self, Edge},
        Generation, PipelineEvent, SearchOutcome, Target,
    },
    render::{
        html::{self, AlertKind},
        view,
    },
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn internal(err: Error) -> (StatusCode, String) {
    warn!(%err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Run a search and stream every output update as an SSE `render` event.
///
/// Every connection owns its render targets, so runs on different connections never
/// supersede each other. Closing the connection stops the run at its next update. The
/// stream ends with a `done` event once the run finishes or fails.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let threshold = query
        .threshold
        .unwrap_or(state.settings.similarity_threshold);
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let mut tx = tx;
        let ticket = Generation::default().begin();
        if let Ok(report) = pipeline
            .run_with(ticket, &query.q, query.source, &mut tx)
            .await
        {
            info!(records = report.outcome.records.len(), "search finished");
        }
    });

    let mut renderer = Renderer::new(threshold);
    let updates = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .flat_map(move |event| stream::iter(renderer.render(event)))
    .map(|render| Ok::<_, Infallible>(sse_event(&render)));
    let done = stream::once(async { Ok::<_, Infallible>(Event::default().event("done").data("")) });

    Sse::new(updates.chain(done)).keep_alive(KeepAlive::default())
}

fn sse_event(render: &RenderEvent) -> Event {
    match Event::default().event("render").json_data(render) {
        Ok(event) => event,
        Err(err) => Event::default().event("error").data(err.to_string()),
    }
}

/// Turns one run's pipeline events into HTML updates.
///
/// Remembers the latest results so the graph can carry the records it links.
#[derive(Debug)]
pub struct Renderer {
    threshold: f64,
    outcome: Option<Arc<SearchOutcome>>,
}

impl Renderer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            outcome: None,
        }
    }

    /// HTML updates for one event. A template failure is shown as an error alert.
    pub fn render(&mut self, event: PipelineEvent) -> Vec<RenderEvent> {
        let target = event.target();
        let rendered = match event {
            PipelineEvent::Started => {
                self.outcome = None;
                return vec![
                    RenderEvent::clear(Target::Error),
                    RenderEvent::clear(Target::Network),
                    RenderEvent::clear(Target::Summary),
                ];
            }
            PipelineEvent::Progress { text, .. } => html::spinner(text),
            PipelineEvent::Params(params) => html::params_table(&params),
            PipelineEvent::Results(outcome) => {
                let rendered = html::results(&view::results(
                    outcome.source,
                    &outcome.records,
                    &HashSet::new(),
                ));
                self.outcome = Some(outcome);
                rendered
            }
            PipelineEvent::Graph(graph) => {
                let records = self.outcome.as_deref().map_or(&[][..], |o| &o.records[..]);
                html::graph(&graph.with_threshold(self.threshold), records)
            }
            PipelineEvent::GraphError(message) => html::alert(AlertKind::Warning, &message),
            PipelineEvent::Summary { markdown, done } => Ok(html::summary(&markdown, done)),
            PipelineEvent::Error(message) => html::alert(AlertKind::Danger, &message),
        };
        match rendered {
            Ok(html) => vec![RenderEvent::new(target, html)],
            Err(err) => {
                warn!(%err, ?target, "could not render update");
                vec![RenderEvent::new(
                    Target::Error,
                    html::alert(AlertKind::Danger, &err.to_string()).unwrap_or_default(),
                )]
            }
        }
    }
}

pub async fn render_selection(Json(request): Json<RenderRequest>) -> ApiResult<HtmlDto> {
    let records: Vec<Record> = request
        .records
        .into_iter()
        .map(|raw| Record::from_value(request.source, raw))
        .collect();
    let results = view::selection(request.source, &records, &request.selected);
    let html = html::results(&results).map_err(internal)?;
    Ok(Json(HtmlDto { html }))
}

pub async fn edges(Json(request): Json<EdgesRequest>) -> ApiResult<Vec<Edge>> {
    if request.threshold.is_nan() {
        return Err((StatusCode::BAD_REQUEST, "threshold must be a number".into()));
    }
    Ok(Json(similarity::edges(&request.similarity, request.threshold)))
}

pub async fn list_tools() -> Json<&'static [ToolSpec]> {
    Json(tools::registry())
}

/// Single study card, fetched by NCT ID.
pub async fn study(
    Path(nct_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<HtmlDto> {
    let raw = state.pipeline.ctgov().study(&nct_id).await.map_err(|err| match err {
        Error::Api { status, body } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            body,
        ),
        other => internal(other),
    })?;
    let record = Record::from_value(Source::Studies, raw);
    let results = view::results(Source::Studies, std::slice::from_ref(&record), &HashSet::new());
    let html = html::results(&results).map_err(internal)?;
    Ok(Json(HtmlDto { html }))
}
