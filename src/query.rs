//! Query options and per-segment request construction
//!
//! A query carries an optional time range, an optional caller filter, and a
//! field set. The time range does double duty: it selects the segments to
//! search and is merged into the per-segment filter.

use chrono::{DateTime, Utc};

use crate::store::{Filter, FindOptions, SortDirection};

/// Fields of a stored log row available for projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogField {
    /// The message text
    Message,
    /// The write timestamp
    Timestamp,
    /// The severity
    Level,
    /// The structured payload
    Meta,
}

impl LogField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Timestamp => "timestamp",
            Self::Level => "level",
            Self::Meta => "meta",
        }
    }

    /// The default projection: every field.
    pub fn defaults() -> Vec<LogField> {
        vec![Self::Message, Self::Timestamp, Self::Level, Self::Meta]
    }
}

/// Options for a time-ranged query across segments.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Lower bound on entry timestamps (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Upper bound on entry timestamps (inclusive)
    pub to: Option<DateTime<Utc>>,
    /// Caller filter, merged with the time-range predicate
    pub filter: Option<Filter>,
    /// Projected fields; defaults to all of them
    pub fields: Option<Vec<LogField>>,
}

impl QueryOptions {
    /// Query with no bounds: every segment, every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive lower bound.
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the inclusive upper bound.
    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Merge a caller filter into the query.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Project only the named fields.
    pub fn with_fields(mut self, fields: Vec<LogField>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// The effective per-segment filter: caller filter AND the timestamp
    /// bounds that were supplied.
    pub(crate) fn entry_filter(&self) -> Filter {
        let mut clauses = Vec::new();
        if let Some(filter) = &self.filter {
            clauses.push(filter.clone());
        }
        if let Some(from) = self.from {
            clauses.push(Filter::gte("timestamp", from.timestamp_millis()));
        }
        if let Some(to) = self.to {
            clauses.push(Filter::lte("timestamp", to.timestamp_millis()));
        }
        match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        }
    }

    /// Per-segment find options: newest first, projected to the field set.
    pub(crate) fn find_options(&self) -> FindOptions {
        let fields = self.fields.clone().unwrap_or_else(LogField::defaults);
        FindOptions::default()
            .sorted_by("timestamp", SortDirection::Descending)
            .with_projection(fields.iter().map(|field| field.as_str().to_string()).collect())
    }
}
