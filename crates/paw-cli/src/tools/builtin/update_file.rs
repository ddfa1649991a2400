//! Surgical file edit tool

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::tools::{
    required_str, ParameterProperty, ParameterSchema, SecurityLevel, Tool, ToolContext, ToolResult,
};

/// Tool for replacing the first occurrence of a string in a file
pub struct UpdateFileTool;

#[async_trait]
impl Tool for UpdateFileTool {
    fn name(&self) -> &str {
        "update_file"
    }

    fn description(&self) -> &str {
        "Update a file by replacing the first occurrence of a string."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Dangerous
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new()
            .with_required(
                "path",
                ParameterProperty::string("Path to the file to update"),
            )
            .with_required(
                "old",
                ParameterProperty::string("The exact string to find and replace"),
            )
            .with_required("new", ParameterProperty::string("The replacement string"))
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult> {
        let path_str = required_str(args, "path")?;
        let old = required_str(args, "old")?;
        let new = required_str(args, "new")?;

        let path = if PathBuf::from(path_str).is_absolute() {
            PathBuf::from(path_str)
        } else {
            ctx.working_dir.join(path_str)
        };

        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        // Reported tool error, not fatal; the file stays untouched
        if !text.contains(old) {
            return Ok(ToolResult::error(format!(
                "String not found in {}",
                path_str
            )));
        }

        let updated = text.replacen(old, new, 1);
        match fs::write(&path, updated) {
            Ok(()) => Ok(ToolResult::success(format!("Updated {}", path_str))),
            Err(e) => Ok(ToolResult::error(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
