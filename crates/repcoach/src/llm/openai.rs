//! OpenAI-compatible streaming provider.
//!
//! Works with OpenAI, OpenRouter, Ollama and anything else that speaks the
//! `/chat/completions` SSE dialect.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Display;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::{ChatRequest, ChatStream, Message, StreamEvent, ToolCall, ToolDefinition, Usage};

const DONE_MARKER: &str = "[DONE]";
const TRUNCATED_STREAM: &str = "stream ended before completion";

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = StreamRequest {
            model: request.model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: request.tools,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        };

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        Ok(Box::pin(decode_events(response.bytes_stream().eventsource())))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct StreamRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    stream: bool,
    stream_options: StreamOptions,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Deserialize)]
struct StreamToolCall {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionCall>,
}

#[derive(Deserialize)]
struct StreamFunctionCall {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

// ============================================================================
// Chunk Decoder
// ============================================================================

/// Turns SSE `data:` payloads into [`StreamEvent`]s.
///
/// Tool calls arrive in fragments keyed by index (id and name first, then
/// argument pieces) and are emitted whole once the model finishes them.
#[derive(Default)]
struct ChunkDecoder {
    tool_calls: BTreeMap<usize, PartialToolCall>,
    finish_reason: Option<String>,
    usage: Option<Usage>,
    done: bool,
}

#[derive(Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

type DecodedItem = Result<StreamEvent, LLMError>;

impl ChunkDecoder {
    fn push(&mut self, data: &str) -> Vec<DecodedItem> {
        if self.done || data.is_empty() {
            return Vec::new();
        }
        if data == DONE_MARKER {
            return self.finish();
        }

        let chunk: StreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(data = %data, error = %e, "failed to parse SSE chunk");
                return Vec::new();
            }
        };

        if let Some(error) = chunk.error {
            self.done = true;
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map_or_else(|| error.to_string(), str::to_string);
            return vec![Err(LLMError::Stream(message))];
        }

        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }

        let mut out = Vec::new();
        let Some(choice) = chunk.choices.into_iter().next() else {
            return out;
        };

        if let Some(content) = choice.delta.content
            && !content.is_empty()
        {
            out.push(Ok(StreamEvent::Token(content)));
        }

        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let slot = self.tool_calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id {
                slot.id = id;
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    slot.name = name;
                }
                if let Some(arguments) = function.arguments {
                    slot.arguments.push_str(&arguments);
                }
            }
        }

        if let Some(reason) = choice.finish_reason {
            if reason == "tool_calls" {
                out.extend(self.take_tool_calls());
            }
            self.finish_reason = Some(reason);
        }

        out
    }

    /// Flush pending tool calls and emit the terminal `Done`.
    fn finish(&mut self) -> Vec<DecodedItem> {
        if self.done {
            return Vec::new();
        }
        self.done = true;

        let mut out: Vec<DecodedItem> = self.take_tool_calls().into_iter().collect();
        out.push(Ok(StreamEvent::Done {
            finish_reason: self.finish_reason.take(),
            usage: self.usage.take(),
        }));
        out
    }

    /// End of body. Without `[DONE]` or a finish reason the response was cut off.
    fn finish_at_eof(&mut self) -> Vec<DecodedItem> {
        if self.done {
            return Vec::new();
        }
        if self.finish_reason.is_none() {
            self.done = true;
            self.tool_calls.clear();
            return vec![Err(LLMError::Stream(TRUNCATED_STREAM.to_string()))];
        }
        self.finish()
    }

    fn take_tool_calls(&mut self) -> Option<DecodedItem> {
        let calls: Vec<ToolCall> = std::mem::take(&mut self.tool_calls)
            .into_values()
            .filter(|tc| !tc.id.is_empty())
            .map(|tc| ToolCall::new(tc.id, tc.name, tc.arguments))
            .collect();
        (!calls.is_empty()).then_some(Ok(StreamEvent::ToolCalls(calls)))
    }
}

// ============================================================================
// Stream Adapter
// ============================================================================

struct DecodeState<S> {
    events: S,
    decoder: ChunkDecoder,
    pending: VecDeque<DecodedItem>,
    finished: bool,
}

fn decode_events<S, E>(events: S) -> impl Stream<Item = DecodedItem> + Send
where
    S: Stream<Item = Result<eventsource_stream::Event, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        events: Box::pin(events),
        decoder: ChunkDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.events.next().await {
                Some(Ok(event)) => {
                    let decoded = st.decoder.push(&event.data);
                    st.pending.extend(decoded);
                    st.finished = st.decoder.done;
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(LLMError::Stream(e.to_string())));
                }
                None => {
                    st.finished = true;
                    let decoded = st.decoder.finish_at_eof();
                    st.pending.extend(decoded);
                }
            }
        }
    })
}
