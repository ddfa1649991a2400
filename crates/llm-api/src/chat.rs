//! Conversation data model and the model-transport boundary

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back in the matching result
    pub id: String,
    /// Tool name to dispatch on
    pub name: String,
    /// Arguments as a JSON object
    pub arguments: Value,
}

/// Outcome of a single tool call attempt. Exactly one variant is set,
/// and the value is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOutcome {
    Response(String),
    Error(String),
}

/// The resolved result for one [`ToolCallRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Id of the originating call
    pub call_id: String,
    /// Name of the tool that was (or would have been) invoked
    pub name: String,
    pub outcome: ToolOutcome,
}

/// Inline-encoded attachment payload with a declared media type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    /// IANA media type, e.g. `image/png` or `application/pdf`
    pub media_type: String,
    /// Base64-encoded file bytes
    pub data: String,
}

/// One ordered piece of message content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    ToolCall(ToolCallRequest),
    ToolResult(ToolCallResult),
    Image(InlineData),
    Document(InlineData),
}

/// A single conversation message. The conversation itself is an
/// append-only `Vec<Message>` owned by the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Build the tool-role message carrying one result per originating call
    pub fn tool_results(results: Vec<ToolCallResult>) -> Self {
        Self {
            role: Role::Tool,
            parts: results.into_iter().map(Part::ToolResult).collect(),
        }
    }

    /// Concatenation of all text parts, in order
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text(t) = part {
                out.push_str(t);
            }
        }
        out
    }

    /// All tool-call-request parts, in emitted order
    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolCall(tc) => Some(tc),
                _ => None,
            })
            .collect()
    }
}

/// Model-facing declaration of one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's parameters
    pub input_schema: Value,
}

/// One completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: u32,
    /// `None` defers to the model's default sampling temperature
    pub temperature: Option<f32>,
}

/// The transport seam between the agent loop and a model provider.
///
/// Implementations must return one assistant message whose parts preserve
/// the relative order of text and tool-call blocks as the model emitted them.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Message>;
}
