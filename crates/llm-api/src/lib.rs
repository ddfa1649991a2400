//! llm-api: Shared library for the paw agent
//!
//! Provides:
//! - The conversation data model (messages, content parts, tool calls)
//! - The `ChatClient` transport boundary
//! - An Anthropic Messages API client (native tool use + multimodal blocks)

pub mod anthropic;
pub mod chat;

pub use anthropic::AnthropicClient;
pub use chat::{
    ChatClient, ChatRequest, InlineData, Message, Part, Role, ToolCallRequest, ToolCallResult,
    ToolOutcome, ToolSpec,
};
