use async_trait::async_trait;

use super::error::LLMError;
use super::types::{ChatRequest, ChatStream};

/// A chat model that streams its completion.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Open a streaming completion.
    ///
    /// An `Err` here means no stream was opened at all. Failures after that
    /// arrive as `Err` items on the stream.
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LLMError>;
}
