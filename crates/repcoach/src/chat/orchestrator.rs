//! Streaming chat orchestration.
//!
//! Each request gets its own task. The task drives the model stream, runs
//! tool calls, re-prompts the model with their results and pushes
//! [`ChatEvent`]s into a bounded channel that the HTTP response drains.
//!
//! The task stops when:
//! - the model finishes (`Done`)
//! - the wall-clock budget elapses (`TimedOut`)
//! - the model stream fails (`Error`)
//! - the receiver is dropped or the cancel token fires (nothing is sent)

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span, warn};
use ulid::Ulid;

use super::events::{ChatEvent, json_or_string};
use crate::api::{CHAT_FAILED, CHAT_ID_PREFIX, ChatMessage, ChatRole};
use crate::config::{ChatConfig, LlmConfig};
use crate::llm::{ChatRequest, ChatStream, LLMError, LLMProvider, Message, Role, StreamEvent};
use crate::tools::{ToolExecutor, ToolResult};

/// Instruction prepended to every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are RepCoach, a strength and conditioning coach. \
Help the user design workout routines and multi-week programs that fit their goals, \
experience and available equipment. Be concrete: list exercises with sets, reps and rest. \
When you generate a routine or program, first call generation_progress with the full list \
of steps you plan to take, then call it again with the complete updated list whenever a \
step is completed.";

const CHANNEL_CAPACITY: usize = 32;

/// How long past the budget a terminal event may wait for channel space.
const TERMINAL_SEND_GRACE: Duration = Duration::from_secs(1);

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
    /// Wall-clock budget for the whole response, tool round-trips included.
    pub budget: Duration,
    /// Maximum model calls per request.
    pub max_steps: u32,
}

impl ChatSettings {
    #[must_use]
    pub fn from_config(chat: &ChatConfig, llm: &LlmConfig) -> Self {
        Self {
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            system_prompt: chat
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            budget: Duration::from_secs(chat.timeout_seconds),
            max_steps: chat.max_steps.max(1),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to open model stream: {0}")]
    Provider(#[from] LLMError),

    #[error("model did not respond within {0:?}")]
    TimedOut(Duration),
}

/// A running chat response.
pub struct ChatRun {
    /// `chat_<ulid>`, attached to every log line of the producing task.
    pub id: String,
    pub events: mpsc::Receiver<ChatEvent>,
    /// Stops the producing task without waiting for the receiver to drop.
    pub cancel: CancellationToken,
}

pub struct ChatOrchestrator {
    provider: Arc<dyn LLMProvider>,
    tools: ToolExecutor,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    #[must_use]
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolExecutor, settings: ChatSettings) -> Self {
        Self {
            provider,
            tools,
            settings,
        }
    }

    /// Open the first model stream and spawn the task that drives it.
    ///
    /// Errors here happen before any event was produced, so the caller can
    /// still answer with a plain HTTP error.
    pub async fn start(&self, conversation: Vec<ChatMessage>) -> Result<ChatRun, ChatError> {
        let deadline = Instant::now() + self.settings.budget;
        let messages = build_messages(&self.settings.system_prompt, conversation);
        let request = self.request(messages.clone());

        let stream = tokio::time::timeout_at(deadline, self.provider.chat_stream(request))
            .await
            .map_err(|_| ChatError::TimedOut(self.settings.budget))??;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let turn = Turn {
            provider: Arc::clone(&self.provider),
            tools: self.tools.clone(),
            settings: self.settings.clone(),
            messages,
            tx,
        };
        let id = format!("{}{}", CHAT_ID_PREFIX, Ulid::new());
        tokio::spawn(
            turn.run(stream, deadline, cancel.clone())
                .instrument(info_span!("chat", chat_id = %id)),
        );

        Ok(ChatRun {
            id,
            events: rx,
            cancel,
        })
    }

    fn request(&self, messages: Vec<Message>) -> ChatRequest {
        build_request(&self.settings, &self.tools, messages)
    }
}

fn build_request(settings: &ChatSettings, tools: &ToolExecutor, messages: Vec<Message>) -> ChatRequest {
    ChatRequest::new(&settings.model, messages, tools.tool_definitions())
        .with_sampling(settings.temperature, settings.max_tokens)
}

/// Convert the caller's conversation into model messages.
///
/// Caller-supplied `tool` turns carry no call id and are dropped.
fn build_messages(system_prompt: &str, conversation: Vec<ChatMessage>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(Message::text(Role::System, system_prompt));

    for message in conversation {
        let role = match message.role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Assistant,
            ChatRole::System => Role::System,
            ChatRole::Tool => {
                debug!("dropping caller-supplied tool message");
                continue;
            }
        };
        messages.push(Message::text(role, message.content));
    }
    messages
}

// ============================================================================
// Turn (per-request task)
// ============================================================================

enum Outcome {
    Finished(String),
    Failed,
    /// Receiver dropped or cancel token fired.
    Abandoned,
}

struct Turn {
    provider: Arc<dyn LLMProvider>,
    tools: ToolExecutor,
    settings: ChatSettings,
    messages: Vec<Message>,
    tx: mpsc::Sender<ChatEvent>,
}

impl Turn {
    async fn run(mut self, stream: ChatStream, deadline: Instant, cancel: CancellationToken) {
        let watcher = self.tx.clone();
        let budget_seconds = self.settings.budget.as_secs();

        // Dropping `drive` drops the model stream and its upstream connection.
        let terminal = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _ = watcher.closed() => None,
            _ = tokio::time::sleep_until(deadline) => {
                warn!(budget_seconds, "chat response timed out");
                Some(ChatEvent::TimedOut { budget_seconds })
            }
            outcome = self.drive(stream) => match outcome {
                Outcome::Finished(finish_reason) => Some(ChatEvent::Done { finish_reason }),
                Outcome::Failed => Some(ChatEvent::Error {
                    message: CHAT_FAILED.to_string(),
                }),
                Outcome::Abandoned => None,
            },
        };

        let Some(event) = terminal else {
            debug!("chat response abandoned by caller");
            return;
        };
        debug_assert!(event.is_terminal());

        // A caller that stopped reading must not keep the task past the budget.
        let send = self.tx.send(event);
        match tokio::time::timeout_at(deadline + TERMINAL_SEND_GRACE, send).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => debug!("caller left before the terminal event"),
            Err(_) => warn!(budget_seconds, "terminal event dropped, caller not reading"),
        }
    }

    async fn drive(&mut self, mut stream: ChatStream) -> Outcome {
        let mut step = 1;

        loop {
            let mut text = String::new();
            let mut tool_calls = Vec::new();
            let mut finish_reason = None;

            while let Some(item) = stream.next().await {
                match item {
                    Ok(StreamEvent::Token(content)) => {
                        text.push_str(&content);
                        if !self.emit(ChatEvent::TextDelta { content }).await {
                            return Outcome::Abandoned;
                        }
                    }
                    Ok(StreamEvent::ToolCalls(calls)) => tool_calls.extend(calls),
                    Ok(StreamEvent::Done {
                        finish_reason: reason,
                        ..
                    }) => {
                        finish_reason = reason;
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, step, "llm stream failed");
                        return Outcome::Failed;
                    }
                }
            }

            if tool_calls.is_empty() {
                return Outcome::Finished(finish_reason.unwrap_or_else(|| "stop".to_string()));
            }

            self.messages
                .push(Message::assistant_tool_calls(Some(text), tool_calls.clone()));

            for call in tool_calls {
                let invocation = ChatEvent::ToolInvocation {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: json_or_string(&call.function.arguments),
                };
                if !self.emit(invocation).await {
                    return Outcome::Abandoned;
                }

                let result = match self.tools.execute(&call).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(tool = %call.function.name, error = %e, "tool call rejected");
                        ToolResult::failure(
                            serde_json::json!({ "success": false, "error": e.to_string() })
                                .to_string(),
                        )
                    }
                };

                let event = ChatEvent::ToolResult {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    result: json_or_string(&result.content),
                    success: result.success,
                };
                if !self.emit(event).await {
                    return Outcome::Abandoned;
                }
                self.messages.push(Message::tool_result(call.id, result.content));
            }

            if step >= self.settings.max_steps {
                warn!(max_steps = self.settings.max_steps, "chat stopped at step limit");
                return Outcome::Finished("max_steps".to_string());
            }
            step += 1;

            let request = build_request(&self.settings, &self.tools, self.messages.clone());
            stream = match self.provider.chat_stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    error!(error = %e, step, "llm request failed");
                    return Outcome::Failed;
                }
            };
        }
    }

    /// Send an event; `false` once nobody is listening.
    async fn emit(&self, event: ChatEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}
