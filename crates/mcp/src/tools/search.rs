//! Full-text search tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolContext, ToolError};
use crate::types::ToolDefinition;

use super::filter_from_args;

/// Full-text search through log messages. Supports implicit AND between
/// terms, `OR`/`NOT`, `"quoted phrases"`, and trailing-`*` prefixes.
pub struct SearchLogsTool;

#[async_trait]
impl Tool for SearchLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_logs".to_string(),
            description: "Full-text search through log messages. Terms are \
                          ANDed; supports OR, NOT, \"exact phrases\" and \
                          prefix* matching. Searches the latest session by \
                          default."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search expression. Use quotes for phrases, OR/NOT for boolean logic, * for prefix matching."},
                    "source": {"type": "string", "description": "Filter by emitter label."},
                    "verbosity": {"type": "string", "description": "Minimum severity to include."},
                    "limit": {"type": "integer", "description": "Maximum results (default: 100)."},
                    "session_id": {"type": "string", "description": "Search within a specific session."},
                    "instance_id": {"type": "string", "description": "Search within a specific emitter instance."},
                    "all_sessions": {"type": "boolean", "description": "Search across all sessions."}
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if query.is_empty() {
            return Err(ToolError::InvalidInput(
                "query parameter is required".to_string(),
            ));
        }

        let filter = filter_from_args(&args);
        let logs = ctx.store.search(query, &filter)?;
        Ok(json!({
            "count": logs.len(),
            "query": query,
            "logs": logs,
        }))
    }
}
