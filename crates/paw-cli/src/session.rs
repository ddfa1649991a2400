//! Session bootstrap and orchestration
//!
//! Loads (or first writes) the agent instructions file, assembles the
//! system prompt, runs the agent loop, and always attempts memory
//! compaction afterwards.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use llm_api::AnthropicClient;

use crate::agent::{AgentConfig, AgentLoop};
use crate::config::Config;
use crate::memory::{MemoryLog, MEMORY_FILE, RECENT_ENTRIES};
use crate::tools::builtin::create_default_registry;
use crate::tools::router::ToolRouter;
use crate::tools::security::{AutoApprove, TerminalConfirmation};

/// Agent instructions file, read at session start
pub const AGENT_FILE: &str = "AGENT.md";

const AGENT_TEMPLATE: &str = "\
# Agent

You are Paw, a helpful AI assistant with access to the local filesystem and shell.

## Tools

You have 4 tools available:

- **read_file**: Read the contents of a file (text, images, and PDFs)
- **write_file**: Create or overwrite a file
- **update_file**: Replace a string in a file (for surgical edits)
- **bash**: Execute a shell command

## Memory

You have a persistent memory log at `MEMORY.md`. It contains timestamped summaries of past interactions. Since this file grows large over time:
- Use `bash` with `tail -n 30 MEMORY.md` to see recent entries
- Use `bash` with `rg \"search term\" MEMORY.md` to search for specific topics

Consult your memory when it might be relevant to the current task.

## Guidelines

- Read files before modifying them
- Use update_file for small changes, write_file for creating new files or full rewrites
- Keep changes minimal and focused
- Explain what you're doing and why
";

/// Read the instructions file, writing the default template first when it
/// does not exist yet. Template write failure is fatal.
pub fn load_instructions(path: &Path) -> Result<String> {
    if !path.exists() {
        std::fs::write(path, AGENT_TEMPLATE)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote default agent instructions");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Assemble the system prompt from instructions, environment facts, and
/// recent memory.
pub fn build_system_prompt(instructions: &str, working_dir: &Path, recent_memory: &str) -> String {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut system = format!(
        "{}\n\n## Environment\n\n- Working directory: {}\n- Date/time: {}",
        instructions.trim_end(),
        working_dir.display(),
        now
    );
    if !recent_memory.is_empty() {
        system.push_str(&format!("\n\n## Recent Memory\n\n{}", recent_memory));
    }
    system
}

/// Run one complete agent session for the given prompt
pub async fn run(prompt: &str, config: Config, auto_mode: bool) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    let instructions = load_instructions(&working_dir.join(AGENT_FILE))?;
    let memory = MemoryLog::new(working_dir.join(MEMORY_FILE));
    let recent_memory = memory.load_recent(RECENT_ENTRIES).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load recent memory");
        String::new()
    });
    let system = build_system_prompt(&instructions, &working_dir, &recent_memory);

    let client = Arc::new(AnthropicClient::new(config.api_key.clone())?);

    let router = if auto_mode {
        ToolRouter::new(create_default_registry(), AutoApprove)
    } else {
        ToolRouter::new(create_default_registry(), TerminalConfirmation::new())
    };

    let agent = AgentLoop::new(
        client.clone(),
        router,
        AgentConfig::new(config.model.clone()).with_working_dir(working_dir),
    );

    let session = agent.run(&system, prompt).await?;

    // The user's task is already done; compaction failure is only a warning.
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if let Err(e) = memory
        .summarize(
            client.as_ref(),
            &config.memory_model,
            &session.conversation,
            &timestamp,
        )
        .await
    {
        warn!(error = %e, "Memory compaction failed");
        eprintln!("\n(failed to save memory: {})", e);
    }

    Ok(())
}
