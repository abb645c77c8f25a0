//! Read-only resources backed by the log store.

use serde_json::{json, Value};

use loghive_core::{LogFilter, Severity};

use crate::tool::{ToolContext, ToolError};
use crate::types::ResourceInfo;

const MIME_JSON: &str = "application/json";

/// The resource catalog for `resources/list`.
pub fn catalog() -> Vec<ResourceInfo> {
    vec![
        ResourceInfo {
            uri: "logs://recent".to_string(),
            name: "Recent Logs".to_string(),
            description: "The 100 most recent log entries from the current session."
                .to_string(),
            mime_type: MIME_JSON.to_string(),
        },
        ResourceInfo {
            uri: "logs://stats".to_string(),
            name: "Log Statistics".to_string(),
            description: "Current log statistics: totals, counts per source, errors, \
                          warnings, and top categories."
                .to_string(),
            mime_type: MIME_JSON.to_string(),
        },
        ResourceInfo {
            uri: "logs://errors".to_string(),
            name: "Error Logs".to_string(),
            description: "Up to 100 most recent Error and Fatal level entries from \
                          the current session."
                .to_string(),
            mime_type: MIME_JSON.to_string(),
        },
        ResourceInfo {
            uri: "logs://current-session".to_string(),
            name: "Current Session Logs".to_string(),
            description: "The latest session id together with up to 100 of its logs."
                .to_string(),
            mime_type: MIME_JSON.to_string(),
        },
    ]
}

/// Resolve a resource URI to its JSON value. Unknown URIs are an input
/// error surfaced as an RPC error envelope by the dispatcher.
pub fn read(uri: &str, ctx: &ToolContext) -> Result<Value, ToolError> {
    match uri {
        "logs://recent" => {
            let logs = ctx.store.query(&LogFilter::default())?;
            Ok(json!(logs))
        }
        "logs://stats" => {
            let stats = ctx.store.stats(None, None)?;
            Ok(serde_json::to_value(stats).unwrap_or(Value::Null))
        }
        "logs://errors" => {
            let filter = LogFilter {
                min_verbosity: Some(Severity::Error),
                ..LogFilter::default()
            };
            let logs = ctx.store.query(&filter)?;
            Ok(json!(logs))
        }
        "logs://current-session" => {
            let logs = ctx.store.query(&LogFilter::default())?;
            let session_id = ctx.store.latest_session(None)?;
            Ok(json!({
                "session_id": session_id,
                "count": logs.len(),
                "logs": logs,
            }))
        }
        _ => Err(ToolError::InvalidInput(format!("Unknown resource: {uri}"))),
    }
}
