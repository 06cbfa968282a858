//! Turning a question into API parameters through a forced, streamed tool call.

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    data::{QueryParams, Source},
    error::{Error, Result},
    llm::{
        partial_json::{self, MalformedJson},
        tools, ChatClient, ChatMessage, ChatRequest, StreamEvent,
    },
    pipeline::{PipelineEvent, Run},
};

const STUDIES_PROMPT: &str = r#"Find studies that will have the most relevant answers to the user question.
In query.*, don't use phrases as-is. Always identify the most relevant keywords, combining them with AND.
E.g. "violation by the FDA" becomes "violation AND FDA".
E.g. "improper adherence to safety and scientific integrity" becomes "adherence AND safety AND integrity""#;

const LABELS_PROMPT: &str = r#"Find FDA drug labels that will have the most relevant answers to the user question.
Write openFDA search expressions as field:term, e.g. openfda.generic_name:metformin or indications_and_usage:asthma.
Don't use phrases as-is. Always identify the most relevant keywords, combining them with AND.
E.g. "liver damage warnings for statins" becomes "warnings:liver AND openfda.pharm_class_epc:statin"."#;

/// System instruction for the query-building call.
pub fn system_prompt(source: Source) -> &'static str {
    match source {
        Source::Studies => STUDIES_PROMPT,
        Source::DrugLabeling => LABELS_PROMPT,
    }
}

/// Completion request that forces the tool for `source`.
pub fn request(model: &str, question: &str, source: Source) -> ChatRequest {
    ChatRequest::streaming(
        model,
        vec![
            ChatMessage::system(system_prompt(source)),
            ChatMessage::user(question),
        ],
    )
    .force_tool(tools::for_source(source))
}

/// Streamed tool-call arguments: the raw text so far and the last value parsed from it.
///
/// A prefix that cannot be parsed (which only happens when the model emits invalid
/// JSON) leaves the previous value in place.
#[derive(Debug, Clone, Default)]
pub struct ArgsAccumulator {
    raw: String,
    parsed: Value,
}

impl ArgsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw text with the cumulative arguments received so far.
    ///
    /// Returns the newly parsed value, or `None` if this text did not parse.
    pub fn update(&mut self, cumulative: &str) -> Option<&Value> {
        self.raw.clear();
        self.raw.push_str(cumulative);
        match partial_json::parse(&self.raw) {
            Ok(value) => {
                self.parsed = value;
                Some(&self.parsed)
            }
            Err(err) => {
                debug!(%err, "tool arguments not parseable yet");
                None
            }
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Last successfully parsed value (`Null` before anything parsed).
    pub fn current(&self) -> &Value {
        &self.parsed
    }

    /// Parse the complete argument text.
    pub fn finish(&self) -> std::result::Result<Value, MalformedJson> {
        partial_json::parse(&self.raw)
    }
}

/// Stream the tool call, emitting a parameter preview for every parsed increment.
#[instrument(skip(chat, run))]
pub async fn synthesize(
    chat: &ChatClient,
    question: &str,
    source: Source,
    run: &mut Run<'_>,
) -> Result<QueryParams> {
    let tool = tools::for_source(source);
    let mut events = chat.stream(&request(chat.model(), question, source)).await?;
    let mut args = ArgsAccumulator::new();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::ToolArgs { name, args: text } => {
                if let Some(name) = name.as_deref().filter(|n| *n != tool.name) {
                    warn!(called = name, expected = tool.name, "model named a different tool");
                }
                if let Some(value) = args.update(&text) {
                    run.emit(PipelineEvent::Params(QueryParams::from_partial(value)))?;
                }
            }
            StreamEvent::Content(text) => debug!(len = text.len(), "ignoring free-text content"),
            StreamEvent::Error(message) => return Err(Error::Stream(message)),
        }
    }

    if args.raw().trim().is_empty() {
        return Err(Error::MissingToolCall(tool.name.to_string()));
    }
    let params = QueryParams::try_from(args.finish()?)?;
    info!(keys = params.len(), "query parameters ready");
    Ok(params)
}
