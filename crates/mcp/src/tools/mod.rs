//! The tool set backed by the log store and the source manager.

mod clear;
mod query;
mod search;
mod sources;
mod stats;

pub use clear::ClearLogsTool;
pub use query::{QueryLogsTool, TailLogsTool};
pub use search::SearchLogsTool;
pub use sources::{AddFileSourceTool, ListSourcesTool, RemoveSourceTool};
pub use stats::{GetCategoriesTool, GetSessionsTool, GetStatsTool};

use serde_json::{json, Value};

use loghive_core::{LogFilter, LogRecord, Severity};

/// Build a filter from the common tool arguments. Absent or mistyped
/// fields fall back to the filter defaults; an unrecognized verbosity
/// name means `Log`, matching the record decoder.
fn filter_from_args(args: &Value) -> LogFilter {
    let mut filter = LogFilter::default();
    filter.source = str_arg(args, "source");
    filter.category = str_arg(args, "category");
    filter.session_id = str_arg(args, "session_id");
    filter.instance_id = str_arg(args, "instance_id");
    filter.since = args.get("since").and_then(Value::as_f64);
    filter.until = args.get("until").and_then(Value::as_f64);
    if let Some(limit) = args.get("limit").and_then(Value::as_i64) {
        filter.limit = limit;
    }
    if let Some(all) = args.get("all_sessions").and_then(Value::as_bool) {
        filter.all_sessions = all;
    }
    if let Some(verbosity) = args.get("verbosity").and_then(Value::as_str) {
        filter.min_verbosity = Some(Severity::parse(verbosity).unwrap_or(Severity::Log));
    }
    filter
}

fn str_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn logs_result(logs: &[LogRecord]) -> Value {
    json!({
        "count": logs.len(),
        "logs": logs,
    })
}
