//! Tools the model may call mid-generation.

mod error;
mod executor;
pub mod progress;
mod tool;

pub use error::ToolError;
pub use executor::{ToolExecutor, ToolResult};
pub use progress::{GenerationStep, PROGRESS_TOOL_NAME, ProgressTool};
pub use tool::{SharedTool, Tool};
