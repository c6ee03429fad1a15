use serde::Serialize;
use serde_json::Value;

use crate::api::sse;

/// One item of a chat response stream.
///
/// `TextDelta`, `ToolInvocation` and `ToolResult` may repeat and interleave.
/// Exactly one of `Done`, `TimedOut` or `Error` ends a stream, unless the
/// caller went away first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    TextDelta {
        content: String,
    },
    #[serde(rename = "tool_call")]
    ToolInvocation {
        id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        id: String,
        name: String,
        result: Value,
        success: bool,
    },
    Done {
        finish_reason: String,
    },
    #[serde(rename = "timeout")]
    TimedOut {
        budget_seconds: u64,
    },
    Error {
        message: String,
    },
}

impl ChatEvent {
    /// SSE `event:` name for this event.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::TextDelta { .. } => sse::TEXT_DELTA,
            ChatEvent::ToolInvocation { .. } => sse::TOOL_CALL,
            ChatEvent::ToolResult { .. } => sse::TOOL_RESULT,
            ChatEvent::Done { .. } => sse::DONE,
            ChatEvent::TimedOut { .. } => sse::TIMEOUT,
            ChatEvent::Error { .. } => sse::ERROR,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::Done { .. } | ChatEvent::TimedOut { .. } | ChatEvent::Error { .. }
        )
    }
}

/// Parse a JSON string into a value, keeping it as a plain string otherwise.
pub(crate) fn json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
