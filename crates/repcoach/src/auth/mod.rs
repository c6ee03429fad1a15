//! Session verification against the external auth subsystem.
//!
//! The service never issues sessions. It only asks a [`SessionVerifier`]
//! whether an opaque token from the session cookie belongs to a user.

mod error;
mod remote;
mod static_sessions;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AuthConfig, AuthMode};

pub use error::VerifierError;
pub use remote::RemoteSessionVerifier;
pub use static_sessions::StaticSessionVerifier;

/// Result of resolving a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Valid { user_id: String },
    Invalid,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Resolve a session token to a user.
    ///
    /// `Err` means the verifier could not decide; callers must treat it like
    /// `Invalid` and never proceed anonymously.
    async fn resolve(&self, token: &str) -> Result<Session, VerifierError>;
}

pub type SharedVerifier = Arc<dyn SessionVerifier>;

/// Build the verifier selected by `auth.mode`.
pub fn build_verifier(
    config: &AuthConfig,
    session_cookie: &str,
    client: reqwest::Client,
) -> Result<SharedVerifier, VerifierError> {
    match config.mode {
        AuthMode::Static => Ok(Arc::new(StaticSessionVerifier::from_config(
            &config.static_sessions,
        ))),
        AuthMode::Remote => {
            let remote = config.remote.as_ref().ok_or_else(|| {
                VerifierError::Misconfigured("auth.mode is remote but auth.remote is missing".into())
            })?;
            Ok(Arc::new(RemoteSessionVerifier::new(
                client,
                &remote.base_url,
                &remote.session_path,
                session_cookie,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSessionConfig;

    #[tokio::test]
    async fn test_build_static_verifier() {
        let config = AuthConfig {
            mode: AuthMode::Static,
            static_sessions: vec![StaticSessionConfig {
                token: "tok".to_string(),
                user_id: "u1".to_string(),
            }],
            remote: None,
        };
        let verifier = build_verifier(&config, "session_token", reqwest::Client::new()).unwrap();
        assert_eq!(
            verifier.resolve("tok").await.unwrap(),
            Session::Valid {
                user_id: "u1".to_string()
            }
        );
    }

    #[test]
    fn test_remote_mode_requires_remote_section() {
        let config = AuthConfig {
            mode: AuthMode::Remote,
            ..AuthConfig::default()
        };
        let result = build_verifier(&config, "session_token", reqwest::Client::new());
        assert!(matches!(result, Err(VerifierError::Misconfigured(_))));
    }
}
