use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use super::errors::ApiError;
use crate::auth::{Session, SessionVerifier};
use crate::server::AppState;

/// The user behind the session cookie.
///
/// Extraction fails with a 401 JSON error when the cookie is missing, the
/// session is invalid or the verifier cannot decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

impl CurrentUser {
    /// Resolve the session cookie in `headers`, if any.
    pub(crate) async fn resolve(
        state: &AppState,
        headers: &axum::http::HeaderMap,
    ) -> Result<Self, ApiError> {
        let token = state
            .routes
            .session_token(headers)
            .ok_or_else(ApiError::no_session)?;

        match state.verifier.resolve(&token).await {
            Ok(Session::Valid { user_id }) => Ok(Self { id: user_id }),
            Ok(Session::Invalid) => Err(ApiError::unauthorized()),
            Err(e) => {
                warn!(error = %e, "session verification failed");
                Err(ApiError::unauthorized())
            }
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        Self::resolve(state, &parts.headers).await
    }
}
