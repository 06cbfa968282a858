//! Decoding of OpenAI-style `text/event-stream` completion bodies.
//!
//! [`SseDecoder`] turns raw body chunks into event payloads; [`DeltaFolder`] folds the
//! per-chunk deltas into the cumulative [`StreamEvent`]s the pipeline consumes.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Cumulative view of a completion stream after one more chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// All assistant text received so far.
    Content(String),
    /// All tool-call argument text received so far.
    ToolArgs { name: Option<String>, args: String },
    /// The stream reported an error, or a chunk could not be decoded.
    Error(String),
}

/// Splits a byte stream into server-sent event `data` payloads.
///
/// Bytes are buffered until a full line is available, so multi-byte characters and
/// lines split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed one body chunk and return the payloads of every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(idx) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=idx).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.line(rest.trim_end_matches('\r')) {
                events.push(event);
            }
        }
        if let Some(event) = self.dispatch() {
            events.push(event);
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Accumulates streamed deltas into cumulative content and tool arguments.
#[derive(Debug, Default)]
pub struct DeltaFolder {
    content: String,
    tool: Option<String>,
    args: String,
    done: bool,
}

impl DeltaFolder {
    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fold one event payload. Returns an event when the payload changed anything.
    pub fn fold(&mut self, data: &str) -> Option<StreamEvent> {
        let data = data.trim();
        if self.done || data.is_empty() {
            return None;
        }
        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        let chunk: CompletionChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(err) => {
                return Some(StreamEvent::Error(format!(
                    "could not decode stream chunk ({err}): {data}"
                )))
            }
        };
        if let Some(error) = chunk.error {
            return Some(StreamEvent::Error(error_message(&error)));
        }

        let mut content_changed = false;
        let mut args_changed = false;
        for delta in chunk.choices.into_iter().filter_map(|c| c.delta) {
            if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                self.content.push_str(&text);
                content_changed = true;
            }
            // Only one tool is ever offered, so every tool-call delta extends the same call.
            for call in delta.tool_calls.into_iter().flatten() {
                let Some(function) = call.function else {
                    continue;
                };
                if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                    self.tool = Some(name);
                }
                if let Some(args) = function.arguments.filter(|a| !a.is_empty()) {
                    self.args.push_str(&args);
                    args_changed = true;
                }
            }
        }

        if args_changed {
            debug!(len = self.args.len(), "tool arguments extended");
            Some(StreamEvent::ToolArgs {
                name: self.tool.clone(),
                args: self.args.clone(),
            })
        } else if content_changed {
            Some(StreamEvent::Content(self.content.clone()))
        } else {
            None
        }
    }
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string())
}
