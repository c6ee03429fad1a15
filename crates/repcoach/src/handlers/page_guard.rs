//! Page guard: session check with redirect semantics.
//!
//! Wraps the page router (everything except the login page). API routes use
//! the [`CurrentUser`] extractor instead, which answers with 401 JSON.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::current_user::CurrentUser;
use crate::server::AppState;

/// Resolve the session or redirect (303) to `{login_path}?next={path}`.
///
/// On success the [`CurrentUser`] is stored in the request extensions.
pub async fn require_page_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let resolved = CurrentUser::resolve(&state, request.headers()).await;
    match resolved {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => {
            let path = request.uri().path();
            debug!(path = %path, "redirecting page request to login");
            Redirect::to(&login_location(state.routes.login_path(), path)).into_response()
        }
    }
}

fn login_location(login_path: &str, next: &str) -> String {
    format!("{login_path}?next={}", urlencoding::encode(next))
}
