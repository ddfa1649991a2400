//! Shell command execution tool

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::tools::{
    required_str, ParameterProperty, ParameterSchema, SecurityLevel, Tool, ToolContext, ToolResult,
};

/// Returned instead of an empty string so downstream previews stay meaningful
const NO_OUTPUT: &str = "(no output)";

/// Tool for executing shell commands
pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its output."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Dangerous
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required(
            "command",
            ParameterProperty::string("The shell command to execute"),
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult> {
        let command = required_str(args, "command")?;

        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // On timeout the output future is dropped; the child must
            // not outlive it.
            .kill_on_drop(true);

        let result = timeout(Duration::from_secs(ctx.command_timeout_secs), cmd.output()).await;

        match result {
            Ok(Ok(output)) => {
                // stdout first, then stderr, no separator
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));

                if !output.status.success() {
                    let code = output
                        .status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    combined.push_str(&format!("\n(exit code: {})", code));
                }

                if combined.is_empty() {
                    Ok(ToolResult::success(NO_OUTPUT))
                } else {
                    Ok(ToolResult::success(combined))
                }
            }
            Ok(Err(e)) => Ok(ToolResult::error(format!("Failed to execute command: {}", e))),
            Err(_) => Ok(ToolResult::error(format!(
                "Command timed out after {} seconds",
                ctx.command_timeout_secs
            ))),
        }
    }
}
