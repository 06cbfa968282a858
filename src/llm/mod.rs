//! Chat-completion plumbing: request types, streaming client, tool schemas and the
//! tolerant argument parser.

pub mod client;
pub mod partial_json;
pub mod sse;
pub mod tools;

use serde::Serialize;
use serde_json::Value;

pub use client::ChatClient;
pub use sse::StreamEvent;
pub use tools::ToolSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    /// A streamed completion over `messages`.
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            stream: true,
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Offer `tool` as the only tool and require the model to call it.
    pub fn force_tool(mut self, tool: &ToolSpec) -> Self {
        self.tools = Some(vec![tool.as_function()]);
        self.tool_choice = Some(tool.choice());
        self
    }
}
