//! Streaming, tool-augmented chat.

mod events;
mod orchestrator;
mod stream;

pub use events::ChatEvent;
pub use orchestrator::{
    ChatError, ChatOrchestrator, ChatRun, ChatSettings, DEFAULT_SYSTEM_PROMPT,
};
pub use stream::{ChatEventStream, to_sse_event};
