//! Verifier backed by a fixed token table from the config file.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Session, SessionVerifier, VerifierError};
use crate::config::StaticSessionConfig;

/// Tokens are kept only as SHA-256 digests and compared digest to digest.
pub struct StaticSessionVerifier {
    sessions: Vec<([u8; 32], String)>,
}

impl StaticSessionVerifier {
    #[must_use]
    pub fn from_config(sessions: &[StaticSessionConfig]) -> Self {
        Self::new(
            sessions
                .iter()
                .map(|s| (s.token.as_str(), s.user_id.as_str())),
        )
    }

    pub fn new<'a>(sessions: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            sessions: sessions
                .into_iter()
                .filter(|(token, _)| !token.is_empty())
                .map(|(token, user_id)| (digest(token), user_id.to_string()))
                .collect(),
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[async_trait]
impl SessionVerifier for StaticSessionVerifier {
    async fn resolve(&self, token: &str) -> Result<Session, VerifierError> {
        let provided = digest(token);
        let session = self
            .sessions
            .iter()
            .find(|(expected, _)| *expected == provided)
            .map_or(Session::Invalid, |(_, user_id)| Session::Valid {
                user_id: user_id.clone(),
            });
        Ok(session)
    }
}
