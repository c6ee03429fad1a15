//! Gate middleware in front of every route.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::errors::ApiError;
use crate::gate::GateDecision;
use crate::server::AppState;

/// Reject protected API requests that carry no session cookie.
///
/// Never resolves the session and never touches session state.
pub async fn session_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.routes.authorize(request.uri().path(), request.headers()) {
        GateDecision::Allow(_) => next.run(request).await,
        GateDecision::Reject => {
            debug!(path = %request.uri().path(), "rejected request without session");
            ApiError::no_session().into_response()
        }
    }
}
