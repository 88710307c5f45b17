//! Error handling for chronosink
//!
//! One error kind per failure surface: initialization, segment resolution,
//! the write path, the query path, and configuration. Store-level failures
//! are carried as sources so callers can reach the backend error.

use thiserror::Error;

use crate::segment::SegmentError;
use crate::store::StoreError;

/// Errors surfaced by sink operations
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata store could not be reached or provisioned. Subsequent
    /// calls retry initialization.
    #[error("initialization failed: {0}")]
    Initialization(#[source] StoreError),

    /// Finding, sealing, or creating a segment failed
    #[error("segment resolution failed: {0}")]
    SegmentResolution(#[from] SegmentError),

    /// The insert into the resolved segment failed; the entry is lost
    #[error("write failed: {0}")]
    Write(#[source] StoreError),

    /// A constituent segment query failed; the whole query fails
    #[error("query failed: {0}")]
    Query(#[source] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is an initialization error
    pub fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }

    /// Check if this is a write-path error
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }

    /// Check if this is a query-path error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}
