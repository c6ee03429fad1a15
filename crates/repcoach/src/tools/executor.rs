//! Name-keyed tool registry used by the chat orchestrator.

use std::collections::HashMap;

use tracing::debug;

use super::error::ToolError;
use super::tool::SharedTool;
use crate::llm::{ToolCall, ToolDefinition};

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    /// Content fed back to the model.
    pub content: String,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    /// Failed call, visible to the model so it can retry.
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
        }
    }
}

#[derive(Default, Clone)]
pub struct ToolExecutor {
    tools: HashMap<String, SharedTool>,
}

impl ToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, tool: SharedTool) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = &tool_call.function.name;
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.clone()))?;

        debug!(
            tool = %name,
            call_id = %tool_call.id,
            arguments = %tool_call.function.arguments,
            "Executing tool"
        );
        tool.execute(&tool_call.function.arguments).await
    }

    /// Tool definitions for the model, ordered by name.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|tool| tool.definition()).collect();
        definitions.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        definitions
    }
}
