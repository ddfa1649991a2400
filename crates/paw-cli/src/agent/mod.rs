//! Step-bounded agent orchestration

mod agent_loop;
mod state;

pub use agent_loop::AgentLoop;
pub use state::{AgentConfig, AgentSession, LoopOutcome};
