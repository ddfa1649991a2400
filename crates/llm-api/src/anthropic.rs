//! Anthropic Messages API client
//!
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as a top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Inline `image` / `document` blocks with base64 sources

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chat::{
    ChatClient, ChatRequest, InlineData, Message, Part, Role, ToolCallRequest, ToolOutcome,
    ToolSpec,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a new client with the default endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Override the base URL (for testing or proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Anthropic takes the system prompt as a top-level field, not a message.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<String> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(msg.text()),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    /// Convert conversation messages to API format with content blocks.
    /// Tool-role messages become user-role messages of `tool_result` blocks.
    fn to_api_messages(messages: &[&Message]) -> Vec<ApiMessage> {
        let mut result = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::Assistant => "assistant",
                Role::User | Role::Tool => "user",
                Role::System => continue, // handled separately
            };

            let blocks: Vec<ContentBlock> = msg
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => ContentBlock::Text { text: text.clone() },
                    Part::ToolCall(tc) => ContentBlock::ToolUse {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        input: tc.arguments.clone(),
                    },
                    Part::ToolResult(tr) => {
                        let (content, is_error) = match &tr.outcome {
                            ToolOutcome::Response(text) => (text.clone(), false),
                            ToolOutcome::Error(err) => (err.clone(), true),
                        };
                        ContentBlock::ToolResult {
                            tool_use_id: tr.call_id.clone(),
                            content,
                            is_error,
                        }
                    }
                    Part::Image(data) => ContentBlock::Image {
                        source: InlineSource::base64(data),
                    },
                    Part::Document(data) => ContentBlock::Document {
                        source: InlineSource::base64(data),
                    },
                })
                .collect();

            result.push(ApiMessage {
                role: role.to_string(),
                content: blocks,
            });
        }

        result
    }

    /// Convert an API response into an assistant message, preserving the
    /// relative order of text and tool-use blocks.
    fn to_message(resp: ApiResponse) -> Message {
        let parts = resp
            .content
            .into_iter()
            .map(|block| match block {
                ResponseBlock::Text { text } => Part::Text(text),
                ResponseBlock::ToolUse { id, name, input } => Part::ToolCall(ToolCallRequest {
                    id,
                    name,
                    arguments: input,
                }),
            })
            .collect();

        Message {
            role: Role::Assistant,
            parts,
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn complete(&self, request: ChatRequest) -> Result<Message> {
        let url = format!("{}/v1/messages", self.base_url);
        let (system, messages) = Self::extract_system(&request.messages);
        let api_messages = Self::to_api_messages(&messages);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": api_messages,
            "max_tokens": request.max_tokens,
        });

        if let Some(sys) = system {
            body["system"] = Value::String(sys);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if !request.tools.is_empty() {
            body["tools"] = serde_json::to_value(&request.tools)?;
        }

        debug!(model = %request.model, messages = api_messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to reach Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Anthropic API error");
            bail!("Anthropic API error (status {}): {}", status.as_u16(), error_body);
        }

        let api_resp: ApiResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        Ok(Self::to_message(api_resp))
    }
}

// --- Anthropic API wire types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
    Image {
        source: InlineSource,
    },
    Document {
        source: InlineSource,
    },
}

#[derive(Debug, Serialize)]
struct InlineSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

impl InlineSource {
    fn base64(data: &InlineData) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: data.media_type.clone(),
            data: data.data.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ToolCallResult;
    use serde_json::json;

    #[test]
    fn constructor() {
        let client = AnthropicClient::new("sk-ant-test").unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let client = AnthropicClient::new("sk-ant-test")
            .unwrap()
            .with_base_url("https://custom.proxy.com/");
        assert_eq!(client.base_url, "https://custom.proxy.com");
    }

    #[test]
    fn system_extraction() {
        let messages = vec![
            Message::system("You are helpful"),
            Message::system("Be concise"),
            Message::user("Hello"),
        ];

        let (system, non_system) = AnthropicClient::extract_system(&messages);
        assert_eq!(system.as_deref(), Some("You are helpful\n\nBe concise"));
        assert_eq!(non_system.len(), 1);
        assert_eq!(non_system[0].role, Role::User);
    }

    #[test]
    fn message_conversion_with_tool_calls() {
        let msg = Message {
            role: Role::Assistant,
            parts: vec![
                Part::Text("Let me look".to_string()),
                Part::ToolCall(ToolCallRequest {
                    id: "toolu_123".to_string(),
                    name: "read_file".to_string(),
                    arguments: json!({"path": "a.txt"}),
                }),
            ],
        };

        let api_msgs = AnthropicClient::to_api_messages(&[&msg]);
        assert_eq!(api_msgs.len(), 1);
        assert_eq!(api_msgs[0].role, "assistant");
        assert_eq!(api_msgs[0].content.len(), 2);
        match &api_msgs[0].content[1] {
            ContentBlock::ToolUse { id, name, .. } => {
                assert_eq!(id, "toolu_123");
                assert_eq!(name, "read_file");
            }
            _ => panic!("Expected tool_use block"),
        }
    }

    #[test]
    fn tool_results_become_user_role() {
        let msg = Message::tool_results(vec![ToolCallResult {
            call_id: "toolu_123".to_string(),
            name: "bash".to_string(),
            outcome: ToolOutcome::Error("User denied this action.".to_string()),
        }]);

        let api_msgs = AnthropicClient::to_api_messages(&[&msg]);
        assert_eq!(api_msgs[0].role, "user");
        match &api_msgs[0].content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "toolu_123");
                assert_eq!(content, "User denied this action.");
                assert!(is_error);
            }
            _ => panic!("Expected tool_result block"),
        }
    }

    #[test]
    fn image_block_wire_shape() {
        let msg = Message {
            role: Role::User,
            parts: vec![
                Part::Text("Here are the requested files:".to_string()),
                Part::Image(InlineData {
                    media_type: "image/png".to_string(),
                    data: "aGVsbG8=".to_string(),
                }),
            ],
        };

        let api_msgs = AnthropicClient::to_api_messages(&[&msg]);
        let json = serde_json::to_value(&api_msgs[0].content[1]).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/png");
        assert_eq!(json["source"]["data"], "aGVsbG8=");
    }

    #[test]
    fn parse_response_preserves_block_order() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "Checking the directory"},
                    {"type": "tool_use", "id": "toolu_abc", "name": "bash", "input": {"command": "ls"}},
                    {"type": "text", "text": "one moment"}
                ]
            }"#,
        )
        .unwrap();

        let msg = AnthropicClient::to_message(resp);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.parts.len(), 3);
        assert!(matches!(msg.parts[0], Part::Text(_)));
        assert!(matches!(msg.parts[1], Part::ToolCall(_)));
        assert!(matches!(msg.parts[2], Part::Text(_)));
        assert_eq!(msg.text(), "Checking the directoryone moment");
    }

    #[test]
    fn tool_spec_serialization() {
        let spec = ToolSpec {
            name: "bash".to_string(),
            description: "Execute a shell command".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"command": {"type": "string"}},
                "required": ["command"]
            }),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], "bash");
        assert_eq!(json["input_schema"]["type"], "object");
    }
}
