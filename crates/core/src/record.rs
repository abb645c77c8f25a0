//! The log record model and its JSON codec.
//!
//! Records arrive as loose JSON over the ingest plane, so the decoder is
//! deliberately lenient: missing fields take documented defaults, unknown
//! fields are ignored, and an unrecognized verbosity string falls back to
//! `Log`. Wrong field *types* still fail the decode: a datagram claiming
//! `"message": 42` is malformed, not defaulted.

use chrono::Utc;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Severity of a log record, ordered so that a lower ordinal is more
/// severe (`Fatal=1` .. `VeryVerbose=7`). `NoLogging` exists for ordinal
/// completeness and is never produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    NoLogging,
    Fatal,
    Error,
    Warning,
    Display,
    Log,
    Verbose,
    VeryVerbose,
}

impl Severity {
    /// Integer ordinal used for storage and threshold comparisons.
    pub fn ordinal(self) -> i64 {
        match self {
            Severity::NoLogging => 0,
            Severity::Fatal => 1,
            Severity::Error => 2,
            Severity::Warning => 3,
            Severity::Display => 4,
            Severity::Log => 5,
            Severity::Verbose => 6,
            Severity::VeryVerbose => 7,
        }
    }

    pub fn from_ordinal(n: i64) -> Severity {
        match n {
            0 => Severity::NoLogging,
            1 => Severity::Fatal,
            2 => Severity::Error,
            3 => Severity::Warning,
            4 => Severity::Display,
            6 => Severity::Verbose,
            7 => Severity::VeryVerbose,
            _ => Severity::Log,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::NoLogging => "NoLogging",
            Severity::Fatal => "Fatal",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Display => "Display",
            Severity::Log => "Log",
            Severity::Verbose => "Verbose",
            Severity::VeryVerbose => "VeryVerbose",
        }
    }

    /// Parse one of the seven named levels, case-sensitively.
    pub fn parse(s: &str) -> Option<Severity> {
        match s {
            "Fatal" => Some(Severity::Fatal),
            "Error" => Some(Severity::Error),
            "Warning" => Some(Severity::Warning),
            "Display" => Some(Severity::Display),
            "Log" => Some(Severity::Log),
            "Verbose" => Some(Severity::Verbose),
            "VeryVerbose" => Some(Severity::VeryVerbose),
            _ => None,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Severity::parse(&s).unwrap_or(Severity::Log))
    }
}

/// One immutable log record.
///
/// `id` and `received_at` are assigned by the store at insert; values
/// carried by an inbound datagram are discarded by the ingest plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_verbosity")]
    pub verbosity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub received_at: f64,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
}

fn default_source() -> String {
    "unknown".to_string()
}

fn default_category() -> String {
    "LogTemp".to_string()
}

fn default_verbosity() -> Severity {
    Severity::Log
}

impl Default for LogRecord {
    fn default() -> Self {
        Self {
            id: 0,
            source: default_source(),
            category: default_category(),
            verbosity: Severity::Log,
            message: String::new(),
            timestamp: 0.0,
            received_at: 0.0,
            session_id: String::new(),
            instance_id: String::new(),
            frame: None,
            file: None,
            line: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert_eq!(Severity::Fatal.ordinal(), 1);
        assert_eq!(Severity::VeryVerbose.ordinal(), 7);
        assert!(Severity::Error.ordinal() < Severity::Warning.ordinal());
    }

    #[test]
    fn test_severity_parse_case_sensitive() {
        assert_eq!(Severity::parse("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("warning"), None);
        assert_eq!(Severity::parse("NoLogging"), None);
    }

    #[test]
    fn test_severity_from_ordinal_unknown_is_log() {
        assert_eq!(Severity::from_ordinal(5), Severity::Log);
        assert_eq!(Severity::from_ordinal(42), Severity::Log);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = LogRecord {
            id: 42,
            source: "server".to_string(),
            category: "LogNet".to_string(),
            verbosity: Severity::Error,
            message: "Connection failed".to_string(),
            timestamp: 12345.678,
            received_at: 12345.9,
            session_id: "match_12345".to_string(),
            instance_id: "server_1735000000000_abcd".to_string(),
            frame: Some(100),
            file: Some("NetDriver.cpp".to_string()),
            line: Some(256),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_decode_defaults_for_missing_fields() {
        let record: LogRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.source, "unknown");
        assert_eq!(record.category, "LogTemp");
        assert_eq!(record.verbosity, Severity::Log);
        assert_eq!(record.message, "");
        assert_eq!(record.session_id, "");
        assert!(record.frame.is_none());
    }

    #[test]
    fn test_decode_unknown_verbosity_defaults_to_log() {
        let record: LogRecord = serde_json::from_str(r#"{"verbosity":"Chatty"}"#).unwrap();
        assert_eq!(record.verbosity, Severity::Log);
    }

    #[test]
    fn test_decode_rejects_wrong_field_type() {
        assert!(serde_json::from_str::<LogRecord>(r#"{"message":42}"#).is_err());
        assert!(serde_json::from_str::<LogRecord>(r#"{"frame":"nope"}"#).is_err());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let record: LogRecord =
            serde_json::from_str(r#"{"message":"hi","color":"red"}"#).unwrap();
        assert_eq!(record.message, "hi");
    }

    #[test]
    fn test_optional_fields_omitted_when_unset() {
        let json = serde_json::to_value(LogRecord::default()).unwrap();
        assert!(json.get("frame").is_none());
        assert!(json.get("file").is_none());
        assert!(json.get("line").is_none());
    }
}
