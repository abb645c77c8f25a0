//! Aggregation tools: `get_stats`, `get_categories`, `get_sessions`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolContext, ToolError};
use crate::types::ToolDefinition;

use super::str_arg;

/// Aggregate counts by source, severity, and category.
pub struct GetStatsTool;

#[async_trait]
impl Tool for GetStatsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_stats".to_string(),
            description: "Get log statistics: totals, counts per source, error \
                          and warning counts, top categories, and session/ \
                          instance counts."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Restrict stats to one emitter label."},
                    "since": {"type": "number", "description": "Only count logs with emit time at or after this value."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = str_arg(&args, "source");
        let since = args.get("since").and_then(Value::as_f64);
        let stats = ctx.store.stats(source.as_deref(), since)?;
        Ok(serde_json::to_value(stats).unwrap_or(Value::Null))
    }
}

/// Sorted distinct category names.
pub struct GetCategoriesTool;

#[async_trait]
impl Tool for GetCategoriesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_categories".to_string(),
            description: "List all distinct log categories seen so far, sorted \
                          alphabetically."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Restrict to categories seen for one emitter label."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = str_arg(&args, "source");
        let categories = ctx.store.categories(source.as_deref())?;
        Ok(json!({ "categories": categories }))
    }
}

/// Session summaries with time range, size, and participating instances.
pub struct GetSessionsTool;

#[async_trait]
impl Tool for GetSessionsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_sessions".to_string(),
            description: "List sessions with first/last activity, log counts, \
                          and participating instance ids. Most recent first."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Only sessions that contain logs from this emitter label."},
                    "limit": {"type": "integer", "description": "Maximum sessions to return (default: 20)."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = str_arg(&args, "source");
        let limit = args.get("limit").and_then(Value::as_i64).unwrap_or(20) as usize;

        let mut sessions = ctx.store.sessions(source.as_deref())?;
        sessions.truncate(limit);

        Ok(json!({
            "count": sessions.len(),
            "sessions": sessions,
        }))
    }
}
