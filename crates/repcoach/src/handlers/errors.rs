//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::{self, ErrorResponse};

/// An error returned to an HTTP caller as `{"error": "..."}`.
///
/// Only the public message leaves the process; log details before building one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Gate rejection: no session cookie at all.
    pub fn no_session() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, api::NO_SESSION)
    }

    /// Session present but not accepted by the verifier.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, api::UNAUTHORIZED)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}
