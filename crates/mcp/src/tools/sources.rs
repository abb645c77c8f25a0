//! Source management tools: add, remove, and list file tailers.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolContext, ToolError};
use crate::types::ToolDefinition;

use super::str_arg;

/// Register a file-tail source for a log file on the server host.
pub struct AddFileSourceTool;

#[async_trait]
impl Tool for AddFileSourceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "add_file_source".to_string(),
            description: "Start tailing a log file on the server host. New \
                          lines appended to the file become log entries with \
                          source 'file-tailer'."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path of the file to tail; must exist."},
                    "name": {"type": "string", "description": "Display name used as the category (defaults to the file name)."}
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("path parameter is required".to_string()))?;
        let name = str_arg(&args, "name");

        match ctx.sources.add_file(path, name).await {
            Some(id) => Ok(json!({ "id": id })),
            None => Err(ToolError::Failed(format!(
                "failed to start tailing {path} (file not found?)"
            ))),
        }
    }
}

/// Stop and forget a registered source.
pub struct RemoveSourceTool;

#[async_trait]
impl Tool for RemoveSourceTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "remove_source".to_string(),
            description: "Stop a registered file-tail source by id.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Source id as returned by add_file_source or list_sources."}
                },
                "required": ["id"]
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let id = args
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("id parameter is required".to_string()))?;

        let removed = ctx.sources.remove(id).await;
        Ok(json!({ "removed": removed }))
    }
}

/// Descriptors for every registered source.
pub struct ListSourcesTool;

#[async_trait]
impl Tool for ListSourcesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_sources".to_string(),
            description: "List registered ingest sources with their current \
                          running state."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let sources = ctx.sources.list().await;
        Ok(json!({
            "count": sources.len(),
            "sources": sources,
        }))
    }
}
