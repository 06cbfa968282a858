//! Request and response bodies for the JSON and SSE routes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{data::Source, pipeline::Target};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_source")]
    pub source: Source,
    /// Initial graph threshold; the configured default when absent.
    pub threshold: Option<f64>,
}

fn default_source() -> Source {
    Source::Studies
}

/// Replace the contents of one output region with `html`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEvent {
    pub target: Target,
    pub html: String,
}

impl RenderEvent {
    pub fn new(target: Target, html: impl Into<String>) -> Self {
        Self {
            target,
            html: html.into(),
        }
    }

    pub fn clear(target: Target) -> Self {
        Self::new(target, String::new())
    }
}

/// Re-render a result list scoped to a graph selection.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    pub source: Source,
    pub records: Vec<Value>,
    #[serde(default)]
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlDto {
    pub html: String,
}

/// Recompute edges from a cached matrix.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgesRequest {
    pub similarity: Vec<Vec<f64>>,
    pub threshold: f64,
}
