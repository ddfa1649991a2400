//! Environment configuration
//!
//! Two optional variables select the model endpoints; the API key is the
//! only required setting and its absence is startup-fatal.

use anyhow::{Context, Result};

/// Main conversation model when `PAW_MODEL` is unset
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Summarization model when `PAW_MEMORY_MODEL` is unset
pub const DEFAULT_MEMORY_MODEL: &str = "claude-haiku-4-5-20251001";

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier for the main agent loop
    pub model: String,
    /// Model identifier for memory summarization (typically cheaper)
    pub memory_model: String,
    /// Anthropic API key
    pub api_key: String,
}

impl Config {
    /// Resolve configuration from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY is not set")?;

        Ok(Self {
            model: env_or("PAW_MODEL", DEFAULT_MODEL),
            memory_model: env_or("PAW_MEMORY_MODEL", DEFAULT_MEMORY_MODEL),
            api_key,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}
