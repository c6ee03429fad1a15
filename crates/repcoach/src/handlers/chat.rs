use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use super::errors::ApiError;
use crate::api::{CHAT_FAILED, ChatRequestBody, EMPTY_MESSAGES};
use crate::chat::ChatEventStream;
use crate::server::AppState;

/// POST /api/chat
///
/// Request body: `{"messages": [{"role": "user", "content": "..."}]}`
///
/// Events emitted:
/// - `text_delta`: `{"content": "..."}`
/// - `tool_call`: `{"id", "name", "arguments"}`
/// - `tool_result`: `{"id", "name", "result", "success"}`
/// - `done`: `{"finish_reason": "..."}`
/// - `timeout`: `{"budget_seconds": n}`
/// - `error`: `{"message": "..."}`
///
/// Every payload also carries a `type` field equal to the event name.
/// A 500 JSON error is returned instead of a stream when the model cannot
/// be reached at all.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };
    if body.messages.is_empty() {
        return ApiError::bad_request(EMPTY_MESSAGES).into_response();
    }

    let message_count = body.messages.len();
    let run = match state.chat.start(body.messages).await {
        Ok(run) => run,
        Err(e) => {
            error!(error = %e, "chat request failed");
            return ApiError::internal(CHAT_FAILED).into_response();
        }
    };

    debug!(chat_id = %run.id, messages = message_count, "Starting chat stream");

    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(state.keep_alive_interval_seconds))
        .text("keep-alive");

    Sse::new(ChatEventStream::new(run))
        .keep_alive(keep_alive)
        .into_response()
}
