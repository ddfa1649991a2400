//! Agent configuration and session state

use std::path::PathBuf;

use llm_api::Message;

/// Configuration for the agent loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model identifier for the main conversation
    pub model: String,
    /// Maximum model turns before forced completion
    pub max_steps: usize,
    /// Maximum output tokens per model turn
    pub max_tokens: u32,
    /// Working directory for tool execution
    pub working_dir: PathBuf,
    /// Shell command timeout in seconds
    pub command_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_steps: 20,
            max_tokens: 16384,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            command_timeout_secs: 120,
        }
    }
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_command_timeout(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model produced a turn with no tool calls
    Completed,
    /// The step bound was exhausted; not an error
    StepLimit,
}

/// The finished session: full transcript plus the termination reason.
/// The conversation stays valid either way and is handed to the memory
/// compactor by the caller.
#[derive(Debug)]
pub struct AgentSession {
    pub conversation: Vec<Message>,
    pub outcome: LoopOutcome,
    /// Number of full steps taken
    pub steps: usize,
}
