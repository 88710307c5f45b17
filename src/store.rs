//! Document-store capability
//!
//! This module defines the narrow surface the sink needs from a document
//! database: create a collection, list collections, provision indexes, and
//! run find/insert/update requests. The sink never talks to a driver
//! directly; it is handed an implementation of [`DocumentStore`] and treats
//! every call as an asynchronous round trip.
//!
//! Filters are a small structured AST rather than driver-native documents,
//! so a backend translates them into its own query form (a MongoDB backend
//! would render `Filter::IsNull("end")` as `{ end: null }`, a SQL backend
//! as `end IS NULL`).

use std::error::Error as StdError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A stored document. Timestamps are carried as epoch-millisecond numbers.
pub type Document = Value;

/// Sort direction, also used as the key direction in index specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending (`1` in document-store index notation)
    Ascending,
    /// Descending (`-1` in document-store index notation)
    Descending,
}

impl SortDirection {
    /// The conventional numeric form used by document-store drivers.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// Structured filter passed to [`DocumentStore::find`] and friends.
///
/// Comparisons against a missing field treat the field as `null`; range
/// comparisons (`Gte`/`Lte`) never match `null`, mirroring document-store
/// type bracketing.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals value (`null` matches a missing field)
    Eq(String, Value),
    /// Field is `null` or absent
    IsNull(String),
    /// Field is greater than or equal to the value
    Gte(String, Value),
    /// Field is less than or equal to the value
    Lte(String, Value),
    /// Every clause matches
    And(Vec<Filter>),
    /// At least one clause matches
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality clause.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// Null-or-absent clause.
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull(field.into())
    }

    /// Greater-or-equal clause.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(field.into(), value.into())
    }

    /// Less-or-equal clause.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(field.into(), value.into())
    }

    /// Conjunction of clauses.
    pub fn and(clauses: Vec<Filter>) -> Self {
        Self::And(clauses)
    }

    /// Disjunction of clauses.
    pub fn or(clauses: Vec<Filter>) -> Self {
        Self::Or(clauses)
    }
}

/// Specification of one index on a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed fields with their directions
    pub keys: Vec<(String, SortDirection)>,
    /// Reject documents duplicating the key tuple (`null` counts as a value)
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field ascending index.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            keys: vec![(field.into(), SortDirection::Ascending)],
            unique: false,
        }
    }

    /// Single-field descending index.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            keys: vec![(field.into(), SortDirection::Descending)],
            unique: false,
        }
    }

    /// Mark the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Index name derived from its key fields.
    pub fn name(&self) -> String {
        let fields: Vec<&str> = self.keys.iter().map(|(field, _)| field.as_str()).collect();
        fields.join("_")
    }
}

/// Options for [`DocumentStore::find`].
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort by a single field
    pub sort: Option<(String, SortDirection)>,
    /// Restrict returned documents to these top-level fields
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    /// Sort results by `field` in `direction`.
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    /// Project only the named fields.
    pub fn with_projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }
}

/// Outcome of an [`DocumentStore::update_one`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Documents matched by the filter
    pub matched: u64,
    /// Documents actually changed
    pub modified: u64,
}

/// Errors surfaced by a [`DocumentStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the document
    #[error("duplicate key in {collection} on index {index}")]
    DuplicateKey {
        /// Collection that rejected the write
        collection: String,
        /// Name of the violated index
        index: String,
    },

    /// Any other backend failure (connection, protocol, server-side)
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    /// Wrap a backend error.
    pub fn backend(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    /// Backend error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Backend(message.into().into())
    }

    /// Duplicate-key rejection for `index` on `collection`.
    pub fn duplicate_key(collection: impl Into<String>, index: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            index: index.into(),
        }
    }

    /// Whether this is a unique-index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The injected document-database handle.
///
/// Implementations must be safe to share across async tasks
/// (`Arc<dyn DocumentStore>`); every method is a self-contained request and
/// callers must tolerate unbounded latency on each.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ensure a collection exists. Creating an existing collection is not an
    /// error.
    async fn create_collection(&self, name: &str) -> StoreResult<()>;

    /// List collection names, optionally restricted to an exact name.
    async fn list_collections(&self, name: Option<&str>) -> StoreResult<Vec<String>>;

    /// Provision indexes on a collection.
    async fn create_indexes(&self, collection: &str, specs: &[IndexSpec]) -> StoreResult<()>;

    /// First document matching the filter, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// All documents matching the filter, sorted and projected per options.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// Insert a single document.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// Set fields on the first document matching the filter. `set` is a flat
    /// document of field/value pairs.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> StoreResult<UpdateReport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_builders() {
        assert_eq!(
            Filter::eq("level", "info"),
            Filter::Eq("level".to_string(), json!("info"))
        );
        assert_eq!(Filter::is_null("end"), Filter::IsNull("end".to_string()));
        assert_eq!(
            Filter::gte("timestamp", 5),
            Filter::Gte("timestamp".to_string(), json!(5))
        );

        let combined = Filter::and(vec![Filter::is_null("end"), Filter::gte("start", 0)]);
        assert!(matches!(combined, Filter::And(clauses) if clauses.len() == 2));
    }

    #[test]
    fn test_index_spec() {
        let spec = IndexSpec::ascending("timestamp");
        assert_eq!(spec.keys, vec![("timestamp".to_string(), SortDirection::Ascending)]);
        assert!(!spec.unique);
        assert_eq!(spec.name(), "timestamp");

        let spec = IndexSpec::descending("start").unique();
        assert!(spec.unique);
        assert_eq!(spec.keys[0].1.as_i32(), -1);
    }

    #[test]
    fn test_store_error_kinds() {
        let err = StoreError::duplicate_key("meta", "name");
        assert!(err.is_duplicate_key());
        assert!(err.to_string().contains("meta"));

        let err = StoreError::message("connection reset");
        assert!(!err.is_duplicate_key());
    }
}
