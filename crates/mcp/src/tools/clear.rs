//! Log deletion tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::{Tool, ToolContext, ToolError};
use crate::types::ToolDefinition;

use super::str_arg;

/// Delete log entries, optionally restricted by source or emit-time
/// upper bound. Destructive.
pub struct ClearLogsTool;

#[async_trait]
impl Tool for ClearLogsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "clear_logs".to_string(),
            description: "Delete log entries from the store. Deleted logs \
                          cannot be recovered; use 'source' or 'before' to \
                          narrow the deletion."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "description": "Only clear logs from this emitter label."},
                    "before": {"type": "number", "description": "Only clear logs with emit time strictly before this value."}
                }
            }),
        }
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let source = str_arg(&args, "source");
        let before = args.get("before").and_then(Value::as_f64);

        let deleted = ctx.store.clear(source.as_deref(), before)?;
        Ok(json!({
            "deleted": deleted,
            "message": format!("{deleted} log entries deleted"),
        }))
    }
}
