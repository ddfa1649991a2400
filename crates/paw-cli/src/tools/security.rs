//! Confirmation handling for confirm-required tools

use async_trait::async_trait;
use std::io::{self, IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use llm_api::ToolCallRequest;

use super::SecurityLevel;

/// Argument values longer than this are truncated in the preview
const PREVIEW_VALUE_LIMIT: usize = 300;

/// Check if stdin is connected to a terminal
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Result of a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// User approved the action
    Approved,
    /// User denied the action
    Denied,
}

/// Trait for handling tool execution confirmations
#[async_trait]
pub trait ConfirmationHandler: Send + Sync {
    /// Request confirmation for a tool call
    async fn confirm(
        &self,
        tool_call: &ToolCallRequest,
        security_level: SecurityLevel,
    ) -> ConfirmationResult;
}

/// Render a human-readable preview of a pending tool call. Values are
/// truncated and multi-line values are shown indented on their own lines.
pub fn display_tool_call(tool_call: &ToolCallRequest) {
    println!("\n  ── {} ──", tool_call.name);

    let args = match tool_call.arguments.as_object() {
        Some(map) => map,
        None => return,
    };

    for (key, value) in args {
        let mut s = match value.as_str() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        };
        if s.chars().count() > PREVIEW_VALUE_LIMIT {
            s = format!("{}…", s.chars().take(PREVIEW_VALUE_LIMIT).collect::<String>());
        }
        if s.contains('\n') {
            println!("  {}:", key);
            for line in s.lines() {
                println!("    {}", line);
            }
        } else {
            println!("  {}: {}", key, s);
        }
    }
}

/// Default terminal-based confirmation handler
pub struct TerminalConfirmation;

impl TerminalConfirmation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationHandler for TerminalConfirmation {
    async fn confirm(
        &self,
        tool_call: &ToolCallRequest,
        security_level: SecurityLevel,
    ) -> ConfirmationResult {
        display_tool_call(tool_call);

        if security_level == SecurityLevel::Safe {
            return ConfirmationResult::Approved;
        }

        // Dangerous tools cannot be confirmed without a terminal
        if !is_interactive() {
            warn!(
                tool = %tool_call.name,
                security_level = %security_level,
                "Non-interactive mode: denying tool that requires confirmation"
            );
            eprintln!(
                "  (stdin is not a TTY; denying '{}' — use --auto to bypass confirmations)",
                tool_call.name
            );
            return ConfirmationResult::Denied;
        }

        print!("  Allow? [Y/n] ");
        let _ = io::stdout().flush();

        // Async stdin so the prompt does not block the runtime
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut input = String::new();

        if reader.read_line(&mut input).await.is_err() {
            debug!("Failed to read stdin, denying");
            return ConfirmationResult::Denied;
        }

        // Bare Enter counts as consent
        let result = match input.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => ConfirmationResult::Approved,
            _ => ConfirmationResult::Denied,
        };

        debug!(tool = %tool_call.name, result = ?result, "User confirmation response");
        result
    }
}

/// A confirmation handler that always approves (auto mode and tests)
pub struct AutoApprove;

#[async_trait]
impl ConfirmationHandler for AutoApprove {
    async fn confirm(
        &self,
        _tool_call: &ToolCallRequest,
        _security_level: SecurityLevel,
    ) -> ConfirmationResult {
        ConfirmationResult::Approved
    }
}

/// A confirmation handler that always denies (for testing)
pub struct AutoDeny;

#[async_trait]
impl ConfirmationHandler for AutoDeny {
    async fn confirm(
        &self,
        _tool_call: &ToolCallRequest,
        _security_level: SecurityLevel,
    ) -> ConfirmationResult {
        ConfirmationResult::Denied
    }
}
