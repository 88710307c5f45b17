//! The sink facade
//!
//! [`ChronoSink`] wires the segment directory, the injected document store,
//! and the observability surfaces into the two operations of the
//! [`LogSink`] capability: accept an entry, answer a time-ranged query.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tracing::{debug, error};

use crate::clock::{Clock, SystemClock};
use crate::config::SinkConfig;
use crate::entry::{LogEntry, LogRecord};
use crate::error::{Error, Result};
use crate::events::{EventBus, SinkEvent};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::query::QueryOptions;
use crate::segment::SegmentDirectory;
use crate::store::{Document, DocumentStore, StoreError};

/// Capability implemented by the core: accept structured entries and answer
/// time-ranged queries. Logging-framework adapters program against this
/// trait rather than the concrete sink.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Persist one entry. Acknowledged exactly once: `Ok` after the insert
    /// lands, `Err` otherwise. Never retried internally.
    async fn write(&self, record: LogRecord) -> Result<()>;

    /// Rows matching the options, concatenated per segment in directory
    /// order; each segment's slice is timestamp-descending.
    async fn query(&self, options: QueryOptions) -> Result<Vec<Document>>;
}

/// Time-partitioned log sink over an injected document store.
pub struct ChronoSink {
    config: SinkConfig,
    store: Arc<dyn DocumentStore>,
    directory: SegmentDirectory,
    clock: Arc<dyn Clock>,
    events: EventBus,
    metrics: MetricsCollector,
}

impl ChronoSink {
    /// Create a sink with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self> {
        Self::with_config(store, SinkConfig::default())
    }

    /// Create a sink with a custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: SinkConfig) -> Result<Self> {
        config.validate()?;
        let directory = SegmentDirectory::new(store.clone(), &config);
        Ok(Self {
            config,
            store,
            directory,
            clock: Arc::new(SystemClock),
            events: EventBus::new(),
            metrics: MetricsCollector::new(),
        })
    }

    /// Replace the time source. Primarily for tests and replay tooling.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The instance identifier.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The active configuration.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// The segment directory backing this sink.
    pub fn directory(&self) -> &SegmentDirectory {
        &self.directory
    }

    /// Register a listener for write outcome events.
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&SinkEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener);
    }

    /// Snapshot the operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Query and deserialize rows into typed entries. Requires the default
    /// field set (a narrower projection cannot reconstruct an entry).
    pub async fn query_entries(&self, options: QueryOptions) -> Result<Vec<LogEntry>> {
        let rows = LogSink::query(self, options).await?;
        rows.into_iter()
            .map(|row| {
                LogEntry::from_document(row).map_err(|err| Error::Query(StoreError::backend(err)))
            })
            .collect()
    }

    async fn ensure_initialized(&self) -> Result<()> {
        self.directory
            .ensure_initialized()
            .await
            .map_err(Error::Initialization)
    }
}

#[async_trait]
impl LogSink for ChronoSink {
    async fn write(&self, record: LogRecord) -> Result<()> {
        self.ensure_initialized().await?;

        let now = self.clock.now();
        let segment = self.directory.resolve_write_segment(now).await?;

        let entry = LogEntry::from_record(record, now);
        let document = entry
            .to_document()
            .map_err(|err| Error::Write(StoreError::backend(err)))?;

        match self.store.insert_one(&segment, document).await {
            Ok(()) => {
                self.metrics.increment_writes();
                self.events.emit(&SinkEvent::Logged {
                    segment: segment.clone(),
                });
                debug!(sink = %self.config.name, segment = %segment, level = %entry.level, "entry logged");
                Ok(())
            }
            Err(err) => {
                self.metrics.increment_write_errors();
                self.events.emit(&SinkEvent::Error {
                    message: err.to_string(),
                });
                error!(sink = %self.config.name, segment = %segment, error = %err, "write failed");
                Err(Error::Write(err))
            }
        }
    }

    async fn query(&self, options: QueryOptions) -> Result<Vec<Document>> {
        self.ensure_initialized().await?;

        let now = self.clock.now();
        let segments = self
            .directory
            .resolve_query_segments(options.from, options.to, now)
            .await?;

        let filter = options.entry_filter();
        let find_options = options.find_options();
        self.metrics.increment_queries();

        // Fan out over every segment concurrently; one failed segment fails
        // the whole query, with no partial results.
        let searches: Vec<_> = segments
            .iter()
            .map(|segment| self.store.find(segment, &filter, &find_options))
            .collect();
        let per_segment = try_join_all(searches).await.map_err(|err| {
            self.metrics.increment_query_errors();
            Error::Query(err)
        })?;

        let rows: Vec<Document> = per_segment.into_iter().flatten().collect();
        self.metrics.add_rows_returned(rows.len());
        debug!(
            sink = %self.config.name,
            segments = segments.len(),
            rows = rows.len(),
            "query complete"
        );
        Ok(rows)
    }
}
