//! # chronosink
//!
//! A time-partitioned log sink over a generic document store. Entries are
//! persisted into time-bounded segments — one collection per segment —
//! rotated by a configurable split policy (daily, monthly, yearly, a fixed
//! interval, or never). Queries fan out across the segments overlapping the
//! requested time range and merge the results.
//!
//! The crate never talks to a database driver directly: it is handed an
//! implementation of [`DocumentStore`] and drives it through a narrow
//! capability surface (create/list collections, provision indexes,
//! find/insert/update). An in-memory backend ([`MemoryStore`]) ships with
//! the crate for tests and embedding.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chronosink::{ChronoSink, Level, LogRecord, LogSink, LogSplit,
//!                  MemoryStore, QueryOptions, SinkConfig};
//!
//! let store = Arc::new(MemoryStore::new());
//! let config = SinkConfig::new().with_log_split(LogSplit::Day);
//! let sink = ChronoSink::with_config(store, config)?;
//!
//! sink.write(LogRecord::new(Level::Info, "service started")).await?;
//!
//! let rows = sink.query(QueryOptions::new()).await?;
//! assert_eq!(rows.len(), 1);
//! ```
//!
//! ## Guarantees
//!
//! - At most one segment is open (accepting writes) at any time; rotation
//!   seals the predecessor at exactly the new segment's start.
//! - Rotation races are resolved by a conditional seal on the directory
//!   row: exactly one new segment is created per expiry event.
//! - Initialization (directory collection + unique indexes) runs once,
//!   shared across concurrent callers, and strictly precedes any write or
//!   query.
//! - No operation retries internally; retry policy belongs to the caller.

pub mod adapter;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
pub mod memory;
pub mod metrics;
pub mod query;
pub mod segment;
pub mod sink;
pub mod store;

pub use adapter::CallbackAdapter;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SinkConfig;
pub use entry::{Level, LogEntry, LogRecord};
pub use error::{Error, Result};
pub use events::SinkEvent;
pub use memory::MemoryStore;
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use query::{LogField, QueryOptions};
pub use segment::{LogSplit, SegmentDirectory, SegmentMeta, SegmentName};
pub use sink::{ChronoSink, LogSink};
pub use store::{
    Document, DocumentStore, Filter, FindOptions, IndexSpec, SortDirection, StoreError,
    UpdateReport,
};
