//! LLM error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The event stream broke or carried an error payload mid-response.
    #[error("stream error: {0}")]
    Stream(String),
}
