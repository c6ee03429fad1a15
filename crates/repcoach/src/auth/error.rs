use thiserror::Error;

/// The verifier could not reach a decision about a token.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("session lookup failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("auth service returned status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("auth service returned an unreadable body: {0}")]
    InvalidResponse(String),

    #[error("invalid auth configuration: {0}")]
    Misconfigured(String),
}
