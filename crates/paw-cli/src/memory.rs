//! Persistent memory log
//!
//! After a session ends, a secondary (cheaper) model compresses the
//! transcript into fixed-format entries appended to `MEMORY.md`. Entries are
//! delimited by literal `---` lines, never edited or deleted, only appended.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use llm_api::{ChatClient, ChatRequest, Message};

/// Default log file name, relative to the working directory
pub const MEMORY_FILE: &str = "MEMORY.md";

/// How many prior entries the summarizing model sees as context
pub const RECENT_ENTRIES: usize = 3;

/// Output budget for the summarization turn
const SUMMARY_MAX_TOKENS: u32 = 1024;

const MEMORY_PROMPT: &str = "\
Summarize the above interaction in one or two entries for a memory log.
Each entry MUST follow this EXACT format (including the --- separators):

---
# [YYYY-MM-DD HH:MM:SS] One-line summary title

Optional short summary if there's more to say than the title.
---

Rules:
- Use timestamp: {timestamp}
- Focus on WHAT was done and the OUTCOME, not the process
- If the task was simple, the title alone is enough (no body)
- If it was complex, add a 1-3 sentence body
- Output ONLY the entry/entries, nothing else";

/// Append-only memory log over a plain-text file
#[derive(Debug, Clone)]
pub struct MemoryLog {
    path: PathBuf,
}

impl MemoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the `n` most recent entries, re-wrapped in their `---`
    /// delimiters, in original order. Empty string when the log is missing
    /// or empty.
    pub fn load_recent(&self, n: usize) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let entries: Vec<&str> = text
            .split("---")
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect();
        let start = entries.len().saturating_sub(n);
        let recent = &entries[start..];

        debug!(total = entries.len(), recent = recent.len(), "Loaded recent memory");
        Ok(format!("---\n{}\n---", recent.join("\n---\n")))
    }

    /// Append raw entry text, normalizing newline boundaries so entries are
    /// always separated cleanly and the file never starts mid-entry.
    pub fn append(&self, entry: &str) -> Result<()> {
        let existing_len = self.path.metadata().map(|m| m.len()).unwrap_or(0);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        if existing_len > 0 && !entry.starts_with('\n') {
            file.write_all(b"\n")?;
        }
        file.write_all(entry.as_bytes())?;
        if !entry.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Ask the secondary model to compress the session into log entries and
    /// append them. Any failure here is the caller's to report as a warning;
    /// it must never fail the session itself.
    #[instrument(skip(self, client, conversation))]
    pub async fn summarize(
        &self,
        client: &dyn ChatClient,
        model: &str,
        conversation: &[Message],
        timestamp: &str,
    ) -> Result<()> {
        let mut messages = conversation.to_vec();
        messages.push(Message::user(
            MEMORY_PROMPT.replace("{timestamp}", timestamp),
        ));

        let reply = client
            .complete(ChatRequest {
                model: model.to_string(),
                messages,
                tools: Vec::new(),
                max_tokens: SUMMARY_MAX_TOKENS,
                temperature: None,
            })
            .await
            .context("Summarization request failed")?;

        let entry = reply.text();
        self.append(&entry)?;
        info!(bytes = entry.len(), path = %self.path.display(), "Saved memory entry");
        Ok(())
    }
}
