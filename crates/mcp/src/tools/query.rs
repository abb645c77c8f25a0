//! Filtered query tools: `query_logs` and `tail_logs`.

use async_trait::async_trait;
use serde_json::{json, Value};

use loghive_core::LogFilter;

use crate::tool::{Tool, ToolContext, ToolError};
use crate::types::ToolDefinition;

use super::{filter_from_args, logs_result, str_arg};

/// Query log entries with filters; scoped to the latest session unless
/// `all_sessions` is set.
pub struct QueryLogsTool;

#[async_trait]
impl Tool for QueryLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "query_logs".to_string(),
            description: "Query log entries with filters. Returns the latest \
                          session's logs by default; set all_sessions to search \
                          every session."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Filter by emitter label, e.g. 'client' or 'server'."},
                    "verbosity": {"type": "string", "description": "Minimum severity: Fatal, Error, Warning, Display, Log, Verbose, VeryVerbose."},
                    "category": {"type": "string", "description": "Filter by log category."},
                    "since": {"type": "number", "description": "Only logs with emit time at or after this value."},
                    "until": {"type": "number", "description": "Only logs with emit time at or before this value."},
                    "limit": {"type": "integer", "description": "Maximum results (default: 100)."},
                    "session_id": {"type": "string", "description": "Filter to a specific session."},
                    "instance_id": {"type": "string", "description": "Filter to a specific emitter instance."},
                    "all_sessions": {"type": "boolean", "description": "Query across all sessions instead of only the latest."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let filter = filter_from_args(&args);
        let logs = ctx.store.query(&filter)?;
        Ok(logs_result(&logs))
    }
}

/// The newest N matching records, like Unix `tail`.
pub struct TailLogsTool;

#[async_trait]
impl Tool for TailLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "tail_logs".to_string(),
            description: "Get the most recent N log entries from the latest \
                          session (or a chosen session/instance)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "count": {"type": "integer", "description": "Number of recent logs (default: 50)."},
                    "source": {"type": "string", "description": "Filter by emitter label."},
                    "session_id": {"type": "string", "description": "Tail a specific session."},
                    "instance_id": {"type": "string", "description": "Tail a specific emitter instance."},
                    "all_sessions": {"type": "boolean", "description": "Tail across all sessions."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let mut filter = LogFilter {
            limit: args.get("count").and_then(Value::as_i64).unwrap_or(50),
            source: str_arg(&args, "source"),
            session_id: str_arg(&args, "session_id"),
            instance_id: str_arg(&args, "instance_id"),
            ..LogFilter::default()
        };
        if let Some(all) = args.get("all_sessions").and_then(Value::as_bool) {
            filter.all_sessions = all;
        }

        let logs = ctx.store.query(&filter)?;
        Ok(logs_result(&logs))
    }
}
