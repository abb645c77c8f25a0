//! Query filters and aggregate value types shared across the workspace.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::Severity;

/// Filter applied to store queries and searches.
///
/// With no `session_id` and `all_sessions` left false, the store scopes
/// the query to the latest session on its own.
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub source: Option<String>,
    /// Admit records at this severity or more severe (lower ordinal).
    pub min_verbosity: Option<Severity>,
    pub category: Option<String>,
    /// Inclusive lower bound on emit time.
    pub since: Option<f64>,
    /// Inclusive upper bound on emit time.
    pub until: Option<f64>,
    pub session_id: Option<String>,
    pub instance_id: Option<String>,
    pub all_sessions: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            source: None,
            min_verbosity: None,
            category: None,
            since: None,
            until: None,
            session_id: None,
            instance_id: None,
            all_sessions: false,
            limit: 100,
            offset: 0,
        }
    }
}

/// Aggregate counts over the stored records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogStats {
    pub total: i64,
    pub by_source: BTreeMap<String, i64>,
    /// Records at severity `Error` or worse (ordinal <= 2).
    pub errors: i64,
    /// Records at exactly severity `Warning` (ordinal == 3).
    pub warnings: i64,
    /// Top 20 categories by record count.
    pub by_category: BTreeMap<String, i64>,
    pub session_count: i64,
    pub instance_count: i64,
    /// Session of the most recently received record, empty when no records.
    pub current_session: String,
}

/// Summary of one session: its time range, size, and participants.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub first_seen: f64,
    pub last_seen: f64,
    pub log_count: i64,
    pub instances: Vec<String>,
}

/// Descriptor for a registered ingest source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub kind: &'static str,
    pub display_name: String,
    pub path: String,
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = LogFilter::default();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
        assert!(!filter.all_sessions);
        assert!(filter.session_id.is_none());
    }

    #[test]
    fn test_stats_serializes_expected_keys() {
        let stats = LogStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        for key in [
            "total",
            "by_source",
            "errors",
            "warnings",
            "by_category",
            "session_count",
            "instance_count",
            "current_session",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
