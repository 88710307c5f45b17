//! Segment-level errors

use thiserror::Error;

use crate::store::StoreError;

/// Errors from segment lookup, sealing, and creation.
#[derive(Error, Debug)]
pub enum SegmentError {
    /// The store rejected or failed a directory operation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A directory row could not be interpreted
    #[error("malformed meta row: {0}")]
    Meta(String),

    /// Rotation claims kept losing to concurrent writers
    #[error("segment claim conflict: {0}")]
    Conflict(String),
}

/// Result type for segment operations.
pub type SegmentResult<T> = std::result::Result<T, SegmentError>;

impl SegmentError {
    /// Create a new malformed-meta error.
    pub fn meta(message: impl Into<String>) -> Self {
        Self::Meta(message.into())
    }

    /// Create a new claim-conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<serde_json::Error> for SegmentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Meta(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SegmentError::meta("missing name field");
        assert!(matches!(err, SegmentError::Meta(_)));

        let err = SegmentError::conflict("lost 4 claims");
        assert!(matches!(err, SegmentError::Conflict(_)));

        let err: SegmentError = StoreError::message("down").into();
        assert!(matches!(err, SegmentError::Store(_)));
    }
}
