//! File read tool

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::attachments::media_kind_for;
use crate::tools::{
    required_str, ParameterProperty, ParameterSchema, SecurityLevel, Tool, ToolContext, ToolResult,
};

/// Tool for reading file contents. Recognized media files are staged as
/// attachments instead of being returned inline.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Supports text files, images, and PDFs."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Safe
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required(
            "path",
            ParameterProperty::string("Path to the file to read (absolute or relative)"),
        )
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult> {
        let path_str = required_str(args, "path")?;

        // Resolve path relative to working directory
        let path = if PathBuf::from(path_str).is_absolute() {
            PathBuf::from(path_str)
        } else {
            ctx.working_dir.join(path_str)
        };

        if !path.exists() {
            return Ok(ToolResult::error(format!(
                "File not found: {}",
                path.display()
            )));
        }

        // Media files are queued for the next user message; the model only
        // sees a short confirmation.
        if let Some(kind) = media_kind_for(&path) {
            let confirmation = {
                let mut stager = ctx
                    .stager
                    .lock()
                    .map_err(|_| anyhow::anyhow!("Attachment stager lock poisoned"))?;
                stager.stage(&path, kind)
            };
            return match confirmation {
                Ok(msg) => Ok(ToolResult::success(msg)),
                Err(e) => Ok(ToolResult::error(format!("Failed to load media: {}", e))),
            };
        }

        match fs::read_to_string(&path) {
            Ok(content) => Ok(ToolResult::success(content)),
            Err(e) => Ok(ToolResult::error(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
