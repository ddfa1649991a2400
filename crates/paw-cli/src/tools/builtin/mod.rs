//! Built-in tools for the agent

mod bash;
mod read_file;
mod update_file;
mod write_file;

pub use bash::BashTool;
pub use read_file::ReadFileTool;
pub use update_file::UpdateFileTool;
pub use write_file::WriteFileTool;

use super::registry::ToolRegistry;

/// Create a registry with the fixed default tool set
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Safe tools (no confirmation needed)
    registry.register(ReadFileTool);

    // Dangerous tools (write/execute, confirm-required)
    registry.register(WriteFileTool);
    registry.register(UpdateFileTool);
    registry.register(BashTool);

    registry
}
