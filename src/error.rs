//! Error type shared by the API clients, the LLM layer and the pipeline.

use thiserror::Error;

use crate::llm::partial_json::MalformedJson;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end a search run.
///
/// None of these are retried: a run that hits one stops and reports it.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote API answered with a non-2xx status.
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport failure before any status was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response or request body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The completion stream reported an error.
    #[error("LLM stream error: {0}")]
    Stream(String),

    /// The completion finished without calling the forced tool.
    #[error("model did not call the `{0}` tool")]
    MissingToolCall(String),

    /// Tool-call arguments could not be parsed at all.
    #[error("malformed tool arguments: {0}")]
    MalformedArguments(#[from] MalformedJson),

    /// Tool-call arguments parsed, but were not a JSON object.
    #[error("tool arguments must be a JSON object, got {0}")]
    ArgumentsNotObject(&'static str),

    /// A parameter value fell outside the enumeration declared in its tool schema.
    #[error("`{key}` value {value:?} is not allowed (expected one of: {})", .allowed.join(", "))]
    InvalidArgument {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    /// The similarity endpoint failed or returned an unusable matrix.
    #[error("similarity request failed: {0}")]
    Similarity(String),

    /// A newer search started; this run must not write any further output.
    #[error("search superseded by a newer request")]
    Superseded,

    /// Template rendering failed.
    #[error("render error: {0}")]
    Render(#[from] askama::Error),
}

impl Error {
    /// Whether this error should be shown to the user.
    ///
    /// A superseded run stays silent because a newer run owns the output.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Error::Superseded)
    }
}
