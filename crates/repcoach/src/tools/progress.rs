//! The `generation_progress` tool.
//!
//! The model calls it with the full list of generation steps every time
//! something changes. Each call is a snapshot that replaces the previous one,
//! so repeated calls are harmless.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ToolError;
use super::executor::ToolResult;
use super::tool::Tool;
use crate::llm::ToolDefinition;

pub const PROGRESS_TOOL_NAME: &str = "generation_progress";

const PROGRESS_MESSAGE: &str = "Progress updated";

/// One entry of a progress snapshot.
///
/// All three fields are required and non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStep {
    pub step: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Deserialize)]
struct ProgressArgs {
    steps: Vec<GenerationStep>,
}

/// Acknowledgement returned to the model and forwarded to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub success: bool,
    pub message: &'static str,
    pub steps: Vec<GenerationStep>,
}

/// Echo a snapshot back, order preserved.
pub fn report(steps: Vec<GenerationStep>) -> ProgressReport {
    ProgressReport {
        success: true,
        message: PROGRESS_MESSAGE,
        steps,
    }
}

pub struct ProgressTool;

fn parameters_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "steps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "step": { "type": "string" },
                        "description": { "type": "string" },
                        "completed": { "type": "boolean" }
                    },
                    "required": ["step", "description", "completed"]
                }
            }
        },
        "required": ["steps"]
    })
}

#[async_trait]
impl Tool for ProgressTool {
    fn name(&self) -> &str {
        PROGRESS_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            PROGRESS_TOOL_NAME,
            "Report progress while generating a workout routine or program. \
             Send the complete list of steps on every call; each call replaces the previous list.",
            parameters_schema(),
        )
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult, ToolError> {
        let args: ProgressArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let content = serde_json::to_string(&report(args.steps))
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(ToolResult::success(content))
    }
}
