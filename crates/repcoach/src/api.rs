//! Wire types shared by the HTTP handlers and the integration tests.
//!
//! Field names and SSE event names here are part of the public contract.

use serde::{Deserialize, Serialize};

use crate::store::{Routine, WorkoutProgram};

// ============================================================================
// SSE Event Names
// ============================================================================

/// SSE event type names used by `POST /api/chat`.
pub mod sse {
    pub const TEXT_DELTA: &str = "text_delta";
    pub const TOOL_CALL: &str = "tool_call";
    pub const TOOL_RESULT: &str = "tool_result";
    pub const DONE: &str = "done";
    pub const TIMEOUT: &str = "timeout";
    pub const ERROR: &str = "error";
}

// ============================================================================
// Public Error Messages
// ============================================================================

pub const NO_SESSION: &str = "Unauthorized - No session";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const CHAT_FAILED: &str = "Failed to process chat request";
pub const EMPTY_MESSAGES: &str = "messages must not be empty";

/// Prefix of the id assigned to each chat response.
pub const CHAT_ID_PREFIX: &str = "chat_";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Chat Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

/// One turn of the caller-supplied conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<ChatMessage>,
}

// ============================================================================
// Workout Types
// ============================================================================

/// Body of `GET /api/routines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutinesResponse {
    pub success: bool,
    pub routines: Vec<Routine>,
}

/// Body of `GET /api/workout-programs` (a bare array).
pub type WorkoutProgramsResponse = Vec<WorkoutProgram>;
