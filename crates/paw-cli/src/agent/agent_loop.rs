//! The step-bounded conversation driver
//!
//! Alternates between model turns and tool resolution: each step requests
//! one assistant turn, resolves its tool calls in emitted order through the
//! router, appends the results as a single tool-role message, then flushes
//! any staged attachments as a follow-up user message. The step bound is
//! structural (a `for` loop), not a convention.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use llm_api::{ChatClient, ChatRequest, Message, Part, Role, ToolCallRequest, ToolOutcome};

use crate::attachments::AttachmentStager;
use crate::tools::router::ToolRouter;
use crate::tools::ToolContext;

use super::state::{AgentConfig, AgentSession, LoopOutcome};

/// Lead-in text for the user message that delivers staged attachments
const ATTACHMENT_LEAD_IN: &str = "Here are the requested files:";

/// Tool output longer than this is truncated in the console preview
const PREVIEW_LIMIT: usize = 500;

/// The agent loop orchestrator
pub struct AgentLoop {
    client: Arc<dyn ChatClient>,
    router: ToolRouter,
    stager: Arc<Mutex<AttachmentStager>>,
    config: AgentConfig,
}

impl AgentLoop {
    /// Create a new agent loop with a fresh attachment queue
    pub fn new(client: Arc<dyn ChatClient>, router: ToolRouter, config: AgentConfig) -> Self {
        Self {
            client,
            router,
            stager: Arc::new(Mutex::new(AttachmentStager::new())),
            config,
        }
    }

    /// Run the conversation to completion or step exhaustion.
    ///
    /// Transport errors propagate; tool failures never do — they are
    /// recovered into the conversation as error-outcome results.
    #[instrument(skip(self, system, prompt), fields(model = %self.config.model))]
    pub async fn run(&self, system: &str, prompt: &str) -> Result<AgentSession> {
        info!(max_steps = self.config.max_steps, "Starting agent loop");

        let mut conversation = vec![Message::system(system), Message::user(prompt)];
        let tools = self.router.registry().tool_specs();
        let ctx = ToolContext::new(self.config.working_dir.clone())
            .with_command_timeout(self.config.command_timeout_secs)
            .with_stager(Arc::clone(&self.stager));

        let mut steps = 0;
        let mut outcome = LoopOutcome::StepLimit;

        for step in 0..self.config.max_steps {
            debug!(step, messages = conversation.len(), "Requesting model turn");

            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: conversation.clone(),
                tools: tools.clone(),
                max_tokens: self.config.max_tokens,
                temperature: None,
            };
            let reply = self.client.complete(request).await?;

            // Partition the turn before the message moves into history
            let text = reply.text();
            let tool_calls: Vec<ToolCallRequest> =
                reply.tool_calls().into_iter().cloned().collect();

            // Appended unconditionally so the final answer stays in history
            conversation.push(reply);
            steps = step + 1;

            if !text.is_empty() {
                println!("\n{}", text);
            }

            if tool_calls.is_empty() {
                info!(steps, "Agent completed task");
                outcome = LoopOutcome::Completed;
                break;
            }

            debug!(tool_count = tool_calls.len(), "Resolving tool calls");
            let mut results = Vec::with_capacity(tool_calls.len());
            for call in &tool_calls {
                let resolved = self.router.resolve(call, &ctx).await;
                match &resolved.result.outcome {
                    ToolOutcome::Response(response) => {
                        println!("  -> {}", preview(response));
                    }
                    ToolOutcome::Error(_) if resolved.denied => {
                        println!("  DENIED");
                    }
                    ToolOutcome::Error(e) => {
                        println!("  ERROR: {}", e);
                    }
                }
                results.push(resolved.result);
            }
            conversation.push(Message::tool_results(results));

            // Staged media goes out as a trailing user message; the model
            // consumes it on its next turn.
            if let Some(message) = self.flush_attachments()? {
                conversation.push(message);
            }
        }

        if outcome == LoopOutcome::StepLimit {
            warn!(max_steps = self.config.max_steps, "Agent reached step limit");
            println!("\n(max steps reached)");
        }

        Ok(AgentSession {
            conversation,
            outcome,
            steps,
        })
    }

    /// Drain the stager into a user message, or `None` when nothing is pending
    fn flush_attachments(&self) -> Result<Option<Message>> {
        let mut stager = self
            .stager
            .lock()
            .map_err(|_| anyhow::anyhow!("Attachment stager lock poisoned"))?;

        if stager.is_empty() {
            return Ok(None);
        }

        let (images, documents) = stager.drain();
        debug!(
            images = images.len(),
            documents = documents.len(),
            "Flushing staged attachments"
        );

        let mut parts = vec![Part::Text(ATTACHMENT_LEAD_IN.to_string())];
        parts.extend(images.into_iter().map(Part::Image));
        parts.extend(documents.into_iter().map(Part::Document));

        Ok(Some(Message {
            role: Role::User,
            parts,
        }))
    }
}

fn preview(output: &str) -> String {
    if output.chars().count() <= PREVIEW_LIMIT {
        output.to_string()
    } else {
        format!("{}…", output.chars().take(PREVIEW_LIMIT).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::create_default_registry;
    use crate::tools::security::{AutoApprove, AutoDeny};
    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Returns queued replies in order; errors when the script runs out
    struct ScriptedClient {
        replies: Mutex<VecDeque<Message>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Message>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(&self, _request: ChatRequest) -> Result<Message> {
            match self.replies.lock().unwrap().pop_front() {
                Some(msg) => Ok(msg),
                None => bail!("script exhausted"),
            }
        }
    }

    /// Always replies with the same message, forever
    struct RepeatClient {
        reply: Message,
    }

    #[async_trait]
    impl ChatClient for RepeatClient {
        async fn complete(&self, _request: ChatRequest) -> Result<Message> {
            Ok(self.reply.clone())
        }
    }

    fn tool_call_message(name: &str, args: serde_json::Value) -> Message {
        Message {
            role: Role::Assistant,
            parts: vec![Part::ToolCall(ToolCallRequest {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments: args,
            })],
        }
    }

    fn loop_with(
        client: impl ChatClient + 'static,
        handler: impl crate::tools::security::ConfirmationHandler + 'static,
        dir: &TempDir,
        max_steps: usize,
    ) -> AgentLoop {
        let router = ToolRouter::new(create_default_registry(), handler);
        let config = AgentConfig::new("test-model")
            .with_max_steps(max_steps)
            .with_working_dir(dir.path().to_path_buf());
        AgentLoop::new(Arc::new(client), router, config)
    }

    #[tokio::test]
    async fn test_natural_completion_on_text_only_turn() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::new(vec![Message::assistant("All done.")]);
        let agent = loop_with(client, AutoApprove, &dir, 20);

        let session = agent.run("system", "do nothing").await.unwrap();
        assert_eq!(session.outcome, LoopOutcome::Completed);
        assert_eq!(session.steps, 1);
        // system + user + assistant
        assert_eq!(session.conversation.len(), 3);
        assert_eq!(session.conversation[2].text(), "All done.");
    }

    #[tokio::test]
    async fn test_list_files_scenario() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hi").unwrap();

        let client = ScriptedClient::new(vec![
            tool_call_message("bash", json!({"command": "ls"})),
            Message::assistant("The directory contains hello.txt"),
        ]);
        let agent = loop_with(client, AutoApprove, &dir, 20);

        let session = agent.run("system", "list files").await.unwrap();
        assert_eq!(session.outcome, LoopOutcome::Completed);
        assert_eq!(session.steps, 2);
        // system, user, assistant(tool call), tool, assistant(text)
        assert_eq!(session.conversation.len(), 5);
        assert_eq!(session.conversation[3].role, Role::Tool);
        match &session.conversation[3].parts[0] {
            Part::ToolResult(r) => match &r.outcome {
                ToolOutcome::Response(out) => assert!(out.contains("hello.txt")),
                other => panic!("Expected response outcome, got {:?}", other),
            },
            _ => panic!("Expected tool result part"),
        }
    }

    #[tokio::test]
    async fn test_step_limit_exhaustion() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let client = RepeatClient {
            reply: tool_call_message("read_file", json!({"path": "a.txt"})),
        };
        let agent = loop_with(client, AutoApprove, &dir, 3);

        let session = agent.run("system", "loop forever").await.unwrap();
        assert_eq!(session.outcome, LoopOutcome::StepLimit);
        assert_eq!(session.steps, 3);
        // 3 assistant turns, each followed by a tool message
        let assistant_turns = session
            .conversation
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count();
        assert_eq!(assistant_turns, 3);
    }

    #[tokio::test]
    async fn test_denied_tool_produces_error_and_no_side_effect() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("secret.txt");

        let client = ScriptedClient::new(vec![
            tool_call_message(
                "write_file",
                json!({"path": target.to_str().unwrap(), "content": "oops"}),
            ),
            Message::assistant("Understood."),
        ]);
        let agent = loop_with(client, AutoDeny, &dir, 20);

        let session = agent.run("system", "write something").await.unwrap();
        assert_eq!(session.outcome, LoopOutcome::Completed);
        assert!(!target.exists(), "denied tool must not run");
        match &session.conversation[3].parts[0] {
            Part::ToolResult(r) => {
                assert_eq!(
                    r.outcome,
                    ToolOutcome::Error("User denied this action.".to_string())
                );
            }
            _ => panic!("Expected tool result part"),
        }
    }

    #[tokio::test]
    async fn test_failing_call_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("real.txt"), "content").unwrap();

        let turn = Message {
            role: Role::Assistant,
            parts: vec![
                Part::ToolCall(ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "read_file".to_string(),
                    arguments: json!({"path": "missing.txt"}),
                }),
                Part::ToolCall(ToolCallRequest {
                    id: "call_2".to_string(),
                    name: "read_file".to_string(),
                    arguments: json!({"path": "real.txt"}),
                }),
            ],
        };
        let client = ScriptedClient::new(vec![turn, Message::assistant("done")]);
        let agent = loop_with(client, AutoApprove, &dir, 20);

        let session = agent.run("system", "read both").await.unwrap();
        let tool_msg = &session.conversation[3];
        assert_eq!(tool_msg.parts.len(), 2);
        match (&tool_msg.parts[0], &tool_msg.parts[1]) {
            (Part::ToolResult(first), Part::ToolResult(second)) => {
                assert_eq!(first.call_id, "call_1");
                assert!(matches!(first.outcome, ToolOutcome::Error(_)));
                assert_eq!(second.call_id, "call_2");
                assert_eq!(
                    second.outcome,
                    ToolOutcome::Response("content".to_string())
                );
            }
            _ => panic!("Expected two tool result parts"),
        }
    }

    #[tokio::test]
    async fn test_staged_attachment_flushes_into_user_message() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shot.png"), b"png bytes").unwrap();

        let client = ScriptedClient::new(vec![
            tool_call_message("read_file", json!({"path": "shot.png"})),
            Message::assistant("I see the image."),
        ]);
        let agent = loop_with(client, AutoApprove, &dir, 20);

        let session = agent.run("system", "look at shot.png").await.unwrap();
        // system, user, assistant, tool, user(attachments), assistant
        assert_eq!(session.conversation.len(), 6);
        let flush = &session.conversation[4];
        assert_eq!(flush.role, Role::User);
        assert_eq!(flush.text(), ATTACHMENT_LEAD_IN);
        assert!(flush
            .parts
            .iter()
            .any(|p| matches!(p, Part::Image(data) if data.media_type == "image/png")));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let dir = TempDir::new().unwrap();
        let client = ScriptedClient::new(vec![]);
        let agent = loop_with(client, AutoApprove, &dir, 20);

        let err = agent.run("system", "anything").await.unwrap_err();
        assert!(err.to_string().contains("script exhausted"));
    }

    #[test]
    fn test_preview_truncation() {
        let short = "a".repeat(500);
        assert_eq!(preview(&short), short);

        let long = "b".repeat(501);
        let p = preview(&long);
        assert!(p.ends_with('…'));
        assert_eq!(p.chars().count(), 501);
    }
}
