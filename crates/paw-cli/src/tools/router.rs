//! Tool routing and dispatch
//!
//! The router is the single front door for resolving a model-issued tool
//! call: name lookup, confirmation gating, then execution. Every failure
//! mode is representable as data so the loop can always append a
//! tool-role message.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use llm_api::{ToolCallRequest, ToolCallResult, ToolOutcome};

use super::registry::ToolRegistry;
use super::security::{ConfirmationHandler, ConfirmationResult};
use super::ToolContext;

/// Literal error recorded when the user denies a confirm-required tool
pub const DENIED_MESSAGE: &str = "User denied this action.";

/// Result of routing a tool call
#[derive(Debug)]
pub enum RouteResult {
    /// Tool executed; carries its output or reported error
    Success(super::ToolResult),
    /// Tool execution was denied by the user
    Denied,
    /// No tool registered under the requested name
    NotFound(String),
    /// Execution raised instead of reporting
    Error(String),
}

/// A resolved call ready to append to the conversation. The `denied`
/// flag marks a user denial distinctly, so callers never have to infer
/// it from the error text (a tool could legitimately emit the same
/// string).
#[derive(Debug)]
pub struct ResolvedCall {
    pub result: ToolCallResult,
    pub denied: bool,
}

/// Router for dispatching tool calls
pub struct ToolRouter {
    registry: ToolRegistry,
    confirmation: Arc<dyn ConfirmationHandler>,
}

impl ToolRouter {
    /// Create a new router with the given registry and confirmation handler
    pub fn new(registry: ToolRegistry, confirmation: impl ConfirmationHandler + 'static) -> Self {
        Self {
            registry,
            confirmation: Arc::new(confirmation),
        }
    }

    /// Route a single tool call
    #[instrument(skip(self, ctx), fields(tool = %tool_call.name))]
    pub async fn route(&self, tool_call: &ToolCallRequest, ctx: &ToolContext) -> RouteResult {
        let tool = match self.registry.get(&tool_call.name) {
            Some(t) => t,
            None => {
                warn!(tool = %tool_call.name, "Tool not found");
                return RouteResult::NotFound(tool_call.name.clone());
            }
        };

        let security_level = tool.security_level();
        debug!(security_level = %security_level, "Tool security level");

        match self.confirmation.confirm(tool_call, security_level).await {
            ConfirmationResult::Approved => {}
            ConfirmationResult::Denied => {
                info!(tool = %tool_call.name, "User denied tool execution");
                return RouteResult::Denied;
            }
        }

        info!(tool = %tool_call.name, "Executing tool");
        match tool.execute(&tool_call.arguments, ctx).await {
            Ok(result) => {
                if result.success {
                    info!(tool = %tool_call.name, output_len = result.output.len(), "Tool executed successfully");
                } else {
                    warn!(tool = %tool_call.name, error = ?result.error, "Tool execution failed");
                }
                RouteResult::Success(result)
            }
            Err(e) => {
                warn!(tool = %tool_call.name, error = %e, "Tool execution error");
                RouteResult::Error(e.to_string())
            }
        }
    }

    /// Resolve a tool call all the way to the conversation-level result.
    /// Denials and lookup failures become error outcomes, never panics.
    pub async fn resolve(&self, tool_call: &ToolCallRequest, ctx: &ToolContext) -> ResolvedCall {
        let (outcome, denied) = match self.route(tool_call, ctx).await {
            RouteResult::Success(result) => {
                if result.success {
                    (ToolOutcome::Response(result.output), false)
                } else {
                    let error = result.error.unwrap_or_else(|| "Tool failed".to_string());
                    (ToolOutcome::Error(error), false)
                }
            }
            RouteResult::Denied => (ToolOutcome::Error(DENIED_MESSAGE.to_string()), true),
            RouteResult::NotFound(name) => {
                (ToolOutcome::Error(format!("unknown tool: {}", name)), false)
            }
            RouteResult::Error(e) => (ToolOutcome::Error(e), false),
        };

        ResolvedCall {
            result: ToolCallResult {
                call_id: tool_call.id.clone(),
                name: tool_call.name.clone(),
                outcome,
            },
            denied,
        }
    }

    /// Get a reference to the registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRouter")
            .field("registry", &self.registry)
            .finish()
    }
}
