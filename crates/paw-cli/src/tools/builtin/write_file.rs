//! File write tool

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::tools::{
    required_str, ParameterProperty, ParameterSchema, SecurityLevel, Tool, ToolContext, ToolResult,
};

/// Tool for creating or overwriting a file
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file with the given content."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Dangerous
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with_required(
                "path",
                ParameterProperty::string("Path to the file to write"),
            )
            .with_required(
                "content",
                ParameterProperty::string("The full content to write"),
            )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult> {
        let path_str = required_str(args, "path")?;
        let content = required_str(args, "content")?;

        let path = if PathBuf::from(path_str).is_absolute() {
            PathBuf::from(path_str)
        } else {
            ctx.working_dir.join(path_str)
        };

        match fs::write(&path, content) {
            Ok(()) => Ok(ToolResult::success(format!(
                "Written {} bytes to {}",
                content.len(),
                path_str
            ))),
            Err(e) => Ok(ToolResult::error(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
