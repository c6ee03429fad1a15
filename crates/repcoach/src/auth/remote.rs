//! Verifier that asks the auth service to resolve the session cookie.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::debug;

use super::{Session, SessionVerifier, VerifierError};

/// Calls `GET {base_url}{session_path}` with the session cookie forwarded.
///
/// - 200 with `{"user":{"id":..}}` or `{"user_id":..}`: valid
/// - 200 with a null user, 401 or 404: invalid
/// - anything else: [`VerifierError`]
pub struct RemoteSessionVerifier {
    client: reqwest::Client,
    url: String,
    cookie_name: String,
}

impl RemoteSessionVerifier {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        session_path: &str,
        cookie_name: &str,
    ) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), session_path),
            cookie_name: cookie_name.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SessionBody {
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct SessionUser {
    id: String,
}

#[async_trait]
impl SessionVerifier for RemoteSessionVerifier {
    async fn resolve(&self, token: &str) -> Result<Session, VerifierError> {
        let response = self
            .client
            .get(&self.url)
            .header(COOKIE, format!("{}={}", self.cookie_name, token))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "auth service rejected session");
            return Ok(Session::Invalid);
        }
        if !status.is_success() {
            return Err(VerifierError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: Option<SessionBody> = response
            .json()
            .await
            .map_err(|e| VerifierError::InvalidResponse(e.to_string()))?;

        let user_id = body.and_then(|b| b.user.map(|u| u.id).or(b.user_id));
        Ok(match user_id {
            Some(user_id) if !user_id.is_empty() => Session::Valid { user_id },
            _ => Session::Invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::get;

    /// Fake auth service: the cookie value picks the response.
    async fn fake_session(headers: HeaderMap) -> axum::response::Response {
        let cookie = headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        match cookie.as_str() {
            "sid=nested" => axum::Json(serde_json::json!({"user": {"id": "u-nested"}})).into_response(),
            "sid=flat" => axum::Json(serde_json::json!({"user_id": "u-flat"})).into_response(),
            "sid=null" => axum::Json(serde_json::Value::Null).into_response(),
            "sid=nouser" => axum::Json(serde_json::json!({"user": null})).into_response(),
            "sid=broken" => (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
            "sid=garbage" => "not json".into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    async fn spawn_auth_service() -> String {
        let app = Router::new().route("/api/auth/get-session", get(fake_session));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    async fn verifier() -> RemoteSessionVerifier {
        let base_url = spawn_auth_service().await;
        RemoteSessionVerifier::new(
            reqwest::Client::new(),
            &base_url,
            "/api/auth/get-session",
            "sid",
        )
    }

    #[tokio::test]
    async fn test_valid_session_shapes() {
        let verifier = verifier().await;
        assert_eq!(
            verifier.resolve("nested").await.unwrap(),
            Session::Valid {
                user_id: "u-nested".to_string()
            }
        );
        assert_eq!(
            verifier.resolve("flat").await.unwrap(),
            Session::Valid {
                user_id: "u-flat".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_sessions() {
        let verifier = verifier().await;
        assert_eq!(verifier.resolve("unknown").await.unwrap(), Session::Invalid);
        assert_eq!(verifier.resolve("null").await.unwrap(), Session::Invalid);
        assert_eq!(verifier.resolve("nouser").await.unwrap(), Session::Invalid);
    }

    #[tokio::test]
    async fn test_upstream_failures_are_errors() {
        let verifier = verifier().await;
        assert!(matches!(
            verifier.resolve("broken").await,
            Err(VerifierError::UnexpectedStatus { status: 502 })
        ));
        assert!(matches!(
            verifier.resolve("garbage").await,
            Err(VerifierError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_error() {
        let verifier = RemoteSessionVerifier::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            "/session",
            "sid",
        );
        assert!(matches!(
            verifier.resolve("any").await,
            Err(VerifierError::Request(_))
        ));
    }
}
