//! Model access for the chat pipeline.

mod error;
mod openai;
mod provider;
mod types;

pub use error::LLMError;
pub use openai::OpenAICompatibleProvider;
pub use provider::LLMProvider;
pub use types::{
    ChatRequest, ChatStream, FunctionCall, FunctionDefinition, Message, Role, StreamEvent,
    ToolCall, ToolDefinition, Usage,
};
