//! HTML fragments for the browser, rendered through askama templates.

use askama::Template;
use serde::Serialize;
use serde_json::Value;

use crate::{
    data::{QueryParams, Record},
    error::Result,
    pipeline::similarity::{Edge, GraphNode, SimilarityGraph, THRESHOLD_STEP},
    render::{
        markdown_to_html, open_links_in_new_tab,
        view::{param_rows, ParamRow, ResultsView, SectionBody},
    },
};

#[derive(Template)]
#[template(path = "params.html")]
struct ParamsTemplate {
    rows: Vec<ParamRow>,
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate<'a> {
    view: &'a ResultsView,
}

#[derive(Template)]
#[template(path = "alert.html")]
struct AlertTemplate<'a> {
    kind: &'static str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "spinner.html")]
struct SpinnerTemplate<'a> {
    text: &'a str,
}

#[derive(Template)]
#[template(path = "graph.html")]
struct GraphTemplate {
    step: f64,
    threshold: f64,
    data: String,
}

/// Bootstrap alert flavours used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Danger,
    Warning,
}

impl AlertKind {
    fn class(self) -> &'static str {
        match self {
            AlertKind::Danger => "danger",
            AlertKind::Warning => "warning",
        }
    }
}

/// Key/value preview of the (possibly still streaming) query parameters.
pub fn params_table(params: &QueryParams) -> Result<String> {
    Ok(ParamsTemplate {
        rows: param_rows(params),
    }
    .render()?)
}

pub fn results(view: &ResultsView) -> Result<String> {
    Ok(ResultsTemplate { view }.render()?)
}

pub fn alert(kind: AlertKind, message: &str) -> Result<String> {
    Ok(AlertTemplate {
        kind: kind.class(),
        message,
    }
    .render()?)
}

pub fn spinner(text: &str) -> Result<String> {
    Ok(SpinnerTemplate { text }.render()?)
}

#[derive(Serialize)]
struct GraphData<'a> {
    nodes: &'a [GraphNode],
    links: Vec<Edge>,
    similarity: &'a [Vec<f64>],
    records: Vec<&'a Value>,
}

/// Threshold slider, graph canvas and the data the browser lays out.
///
/// The raw `records` ride along so a node selection can be re-rendered server side.
pub fn graph(graph: &SimilarityGraph, records: &[Record]) -> Result<String> {
    let data = serde_json::to_string(&GraphData {
        nodes: &graph.nodes,
        links: graph.edges(),
        similarity: &graph.similarity,
        records: records.iter().map(Record::raw).collect(),
    })?;
    Ok(GraphTemplate {
        step: THRESHOLD_STEP,
        threshold: graph.threshold,
        // Keep the payload from closing its own <script> element.
        data: data.replace("</", "<\\/"),
    }
    .render()?)
}

/// Summary pane contents. Links only open in a new tab once the stream is complete.
pub fn summary(markdown: &str, done: bool) -> String {
    let html = markdown_to_html(markdown);
    if done {
        open_links_in_new_tab(&html)
    } else {
        html
    }
}
