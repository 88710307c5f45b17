//! Log entry types
//!
//! [`LogRecord`] is what callers hand the sink; [`LogEntry`] is the stored
//! row, stamped with the write timestamp. On the wire the timestamp is an
//! epoch-millisecond integer so range filters compare numerically.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::store::Document;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Fine-grained tracing
    Trace,
    /// Debugging detail
    Debug,
    /// Routine information
    Info,
    /// Something unexpected but recoverable
    Warn,
    /// An operation failed
    Error,
}

impl Default for Level {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(Error::config(format!("unknown log level: {}", s))),
        }
    }
}

/// An inbound entry, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity
    pub level: Level,
    /// Pre-formatted message text
    pub message: String,
    /// Free-form structured payload
    pub meta: Option<Value>,
}

impl LogRecord {
    /// Create a record with no structured payload.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            meta: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A stored log row. Immutable once inserted; never moved between segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Write timestamp (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: Level,
    /// Pre-formatted message text
    pub message: String,
    /// Free-form structured payload (`null` when none was supplied)
    #[serde(default)]
    pub meta: Value,
}

impl LogEntry {
    /// Stamp a record with the write timestamp.
    pub fn from_record(record: LogRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            level: record.level,
            message: record.message,
            meta: record.meta.unwrap_or(Value::Null),
        }
    }

    /// Wire form of the entry.
    pub fn to_document(&self) -> serde_json::Result<Document> {
        serde_json::to_value(self)
    }

    /// Parse a stored row. Fails if the default fields were projected away.
    pub fn from_document(document: Document) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_level_parse_and_display() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert!("loud".parse::<Level>().is_err());
        assert_eq!(Level::Error.to_string(), "error");
        assert_eq!(Level::default(), Level::Info);
    }

    #[test]
    fn test_record_to_entry() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let record = LogRecord::new(Level::Warn, "disk nearly full")
            .with_meta(json!({"free_bytes": 1024}));
        let entry = LogEntry::from_record(record, ts);

        assert_eq!(entry.timestamp, ts);
        assert_eq!(entry.level, Level::Warn);
        assert_eq!(entry.meta, json!({"free_bytes": 1024}));

        let bare = LogEntry::from_record(LogRecord::new(Level::Info, "ok"), ts);
        assert_eq!(bare.meta, Value::Null);
    }

    #[test]
    fn test_wire_form_uses_epoch_millis() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let entry = LogEntry::from_record(LogRecord::new(Level::Info, "hello"), ts);
        let doc = entry.to_document().unwrap();

        assert_eq!(doc["timestamp"], json!(1_700_000_000_123i64));
        assert_eq!(doc["level"], json!("info"));
        assert_eq!(doc["meta"], Value::Null);

        let parsed = LogEntry::from_document(doc).unwrap();
        assert_eq!(parsed, entry);
    }
}
