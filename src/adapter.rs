//! Callback-style adapter for logging frameworks
//!
//! Logging frameworks hand transports an entry plus a completion callback
//! and move on. [`CallbackAdapter`] translates that calling convention onto
//! the async [`LogSink`] capability: each call spawns the operation onto a
//! tokio runtime and invokes `done` exactly once with the outcome.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::entry::LogRecord;
use crate::error::Result;
use crate::query::QueryOptions;
use crate::sink::{ChronoSink, LogSink};
use crate::store::Document;

/// Fire-and-forget wrapper around a [`ChronoSink`].
pub struct CallbackAdapter {
    sink: Arc<ChronoSink>,
    handle: Handle,
}

impl CallbackAdapter {
    /// Adapter running on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`CallbackAdapter::with_handle`] from synchronous contexts.
    pub fn new(sink: Arc<ChronoSink>) -> Self {
        Self::with_handle(sink, Handle::current())
    }

    /// Adapter spawning onto an explicit runtime handle.
    pub fn with_handle(sink: Arc<ChronoSink>, handle: Handle) -> Self {
        Self { sink, handle }
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &Arc<ChronoSink> {
        &self.sink
    }

    /// Persist an entry; `done` receives the acknowledgement exactly once.
    pub fn log<F>(&self, record: LogRecord, done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        self.handle.spawn(async move {
            done(sink.write(record).await);
        });
    }

    /// Run a query; `done` receives the rows or the failure exactly once.
    pub fn query<F>(&self, options: QueryOptions, done: F)
    where
        F: FnOnce(Result<Vec<Document>>) + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        self.handle.spawn(async move {
            done(sink.query(options).await);
        });
    }
}

/// Callback for callers that ignore the acknowledgement.
pub fn discard<T>(_outcome: Result<T>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Level;
    use crate::memory::MemoryStore;
    use tokio::sync::oneshot;

    fn adapter() -> CallbackAdapter {
        let store = Arc::new(MemoryStore::new());
        CallbackAdapter::new(Arc::new(ChronoSink::new(store).unwrap()))
    }

    #[tokio::test]
    async fn test_log_acknowledges_once() {
        let adapter = adapter();
        let (tx, rx) = oneshot::channel();

        adapter.log(LogRecord::new(Level::Info, "ack me"), move |outcome| {
            // The sender is consumed here, so a second invocation cannot
            // compile, let alone happen.
            tx.send(outcome.is_ok()).unwrap();
        });

        assert!(rx.await.unwrap());
        assert_eq!(adapter.sink().metrics().write_count, 1);
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let adapter = adapter();

        let (tx, rx) = oneshot::channel();
        adapter.log(LogRecord::new(Level::Warn, "queued"), move |outcome| {
            tx.send(outcome).unwrap();
        });
        rx.await.unwrap().unwrap();

        let (tx, rx) = oneshot::channel();
        adapter.query(QueryOptions::new(), move |outcome| {
            tx.send(outcome).unwrap();
        });
        let rows = rx.await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["message"], serde_json::json!("queued"));
    }

    #[tokio::test]
    async fn test_discard_callback_still_writes() {
        let adapter = adapter();
        adapter.log(LogRecord::new(Level::Info, "unwatched"), discard);

        // The spawned write has no completion signal; poll the store.
        for _ in 0..100 {
            if adapter.sink().metrics().write_count == 1 {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("write never completed");
    }
}
