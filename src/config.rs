//! Configuration for the sink
//!
//! This module provides configuration options for the time-partitioned log
//! sink. The database handle itself is injected at construction and is not
//! part of the configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::segment::LogSplit;
use crate::store::IndexSpec;

/// Configuration options for a sink instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Instance identifier, used for diagnostics
    pub name: String,
    /// Collection holding the segment directory
    pub meta_collection_name: String,
    /// Prefix for generated segment collection names
    pub log_collection_prefix: String,
    /// Extra indexes provisioned on every new segment collection
    pub additional_log_indexes: Vec<IndexSpec>,
    /// Split policy governing segment rotation
    pub log_split: LogSplit,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: "chronosink".to_string(),
            meta_collection_name: "meta".to_string(),
            log_collection_prefix: "log".to_string(),
            additional_log_indexes: Vec::new(),
            log_split: LogSplit::None,
        }
    }
}

impl SinkConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instance identifier
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the segment directory collection name
    pub fn with_meta_collection_name(mut self, name: impl Into<String>) -> Self {
        self.meta_collection_name = name.into();
        self
    }

    /// Set the prefix for segment collection names
    pub fn with_log_collection_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_collection_prefix = prefix.into();
        self
    }

    /// Add an index provisioned on every new segment collection
    pub fn with_log_index(mut self, spec: IndexSpec) -> Self {
        self.additional_log_indexes.push(spec);
        self
    }

    /// Set the split policy
    pub fn with_log_split(mut self, split: LogSplit) -> Self {
        self.log_split = split;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("instance name must not be empty"));
        }

        if self.meta_collection_name.is_empty() {
            return Err(Error::config("meta collection name must not be empty"));
        }

        if self.log_collection_prefix.is_empty() {
            return Err(Error::config("log collection prefix must not be empty"));
        }

        if self.meta_collection_name == self.log_collection_prefix {
            return Err(Error::config(
                "meta collection name must differ from the log collection prefix",
            ));
        }

        if matches!(self.log_split, LogSplit::Interval(0)) {
            return Err(Error::config("split interval must be at least 1ms"));
        }

        Ok(())
    }
}
