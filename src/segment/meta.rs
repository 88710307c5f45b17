//! Segment metadata rows
//!
//! One row per segment in the directory collection. `end = None` marks the
//! open segment; on the wire it is an explicit `null` so the unique index
//! on `end` admits at most one open row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;

/// Directory entry describing one segment's name and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Unique, immutable segment identifier; also the backing collection name
    pub name: String,
    /// Segment activation time (epoch milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// Seal time; `None` while the segment is accepting writes
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub end: Option<DateTime<Utc>>,
}

impl SegmentMeta {
    /// A freshly opened segment.
    pub fn open(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start,
            end: None,
        }
    }

    /// Whether this segment is still accepting writes.
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Wire form of the row.
    pub fn to_document(&self) -> serde_json::Result<Document> {
        serde_json::to_value(self)
    }

    /// Parse a directory row.
    pub fn from_document(document: Document) -> serde_json::Result<Self> {
        serde_json::from_value(document)
    }
}
