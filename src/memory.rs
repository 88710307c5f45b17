//! In-memory document store
//!
//! A complete [`DocumentStore`] backend over process memory, for tests and
//! for embedding the sink without a database. It evaluates the structured
//! filter AST, applies sort and projection, and enforces unique indexes the
//! way a document store does: `null` (or an absent field) participates as a
//! value, so two open segment rows collide on the unique `end` index.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::store::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, SortDirection, StoreError,
    StoreResult, UpdateReport,
};

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

/// In-memory [`DocumentStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }
}

fn field_of<'a>(document: &'a Document, field: &str) -> &'a Value {
    document.get(field).unwrap_or(&Value::Null)
}

/// Order two values for range filters and sorting. Numbers compare
/// numerically, strings lexicographically; everything else (including
/// `null`) is incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches(filter: &Filter, document: &Document) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, value) => field_of(document, field) == value,
        Filter::IsNull(field) => field_of(document, field).is_null(),
        Filter::Gte(field, value) => {
            matches!(
                compare_values(field_of(document, field), value),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            )
        }
        Filter::Lte(field, value) => {
            matches!(
                compare_values(field_of(document, field), value),
                Some(Ordering::Less) | Some(Ordering::Equal)
            )
        }
        Filter::And(clauses) => clauses.iter().all(|clause| matches(clause, document)),
        Filter::Or(clauses) => clauses.iter().any(|clause| matches(clause, document)),
    }
}

fn project(document: &Document, projection: Option<&Vec<String>>) -> Document {
    let (Some(fields), Some(object)) = (projection, document.as_object()) else {
        return document.clone();
    };
    let mut projected = serde_json::Map::new();
    for field in fields {
        if let Some(value) = object.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    Value::Object(projected)
}

fn index_key(document: &Document, spec: &IndexSpec) -> Vec<Value> {
    spec.keys
        .iter()
        .map(|(field, _)| field_of(document, field).clone())
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.collections.write().entry(name.to_string()).or_default();
        Ok(())
    }

    async fn list_collections(&self, name: Option<&str>) -> StoreResult<Vec<String>> {
        let collections = self.collections.read();
        let mut names: Vec<String> = match name {
            Some(wanted) => collections.keys().filter(|n| *n == wanted).cloned().collect(),
            None => collections.keys().cloned().collect(),
        };
        names.sort();
        Ok(names)
    }

    async fn create_indexes(&self, collection: &str, specs: &[IndexSpec]) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();
        entry.indexes.extend_from_slice(specs);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(None);
        };
        Ok(entry
            .documents
            .iter()
            .find(|doc| matches(filter, doc))
            .cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut results: Vec<Document> = entry
            .documents
            .iter()
            .filter(|doc| matches(filter, doc))
            .cloned()
            .collect();

        if let Some((field, direction)) = &options.sort {
            results.sort_by(|a, b| {
                let ordering =
                    compare_values(field_of(a, field), field_of(b, field)).unwrap_or(Ordering::Equal);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        Ok(results
            .iter()
            .map(|doc| project(doc, options.projection.as_ref()))
            .collect())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let entry = collections.entry(collection.to_string()).or_default();

        for spec in entry.indexes.iter().filter(|spec| spec.unique) {
            let key = index_key(&document, spec);
            if entry
                .documents
                .iter()
                .any(|existing| index_key(existing, spec) == key)
            {
                return Err(StoreError::duplicate_key(collection, spec.name()));
            }
        }

        entry.documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> StoreResult<UpdateReport> {
        let mut collections = self.collections.write();
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(UpdateReport::default());
        };
        let Some(target) = entry.documents.iter_mut().find(|doc| matches(filter, doc)) else {
            return Ok(UpdateReport::default());
        };

        let Some(changes) = set.as_object() else {
            return Err(StoreError::message("update set must be a document"));
        };
        let mut modified = 0;
        if let Some(object) = target.as_object_mut() {
            for (field, value) in changes {
                if object.get(field) != Some(value) {
                    object.insert(field.clone(), value.clone());
                    modified = 1;
                }
            }
        }

        Ok(UpdateReport {
            matched: 1,
            modified,
        })
    }
}
