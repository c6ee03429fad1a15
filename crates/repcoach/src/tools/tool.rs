use std::sync::Arc;

use async_trait::async_trait;

use super::error::ToolError;
use super::executor::ToolResult;
use crate::llm::ToolDefinition;

/// A schema-described operation the model can invoke.
///
/// Implementations hold their own dependencies so the executor only
/// dispatches by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, as advertised to the model.
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Execute with the raw JSON arguments produced by the model.
    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError>;
}

pub type SharedTool = Arc<dyn Tool>;
