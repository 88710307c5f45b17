//! Operation counters for the sink

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counter collector for sink operations
#[derive(Debug)]
pub struct MetricsCollector {
    /// Number of successful writes
    write_count: AtomicUsize,
    /// Number of failed writes
    write_error_count: AtomicUsize,
    /// Number of queries started
    query_count: AtomicUsize,
    /// Number of failed queries
    query_error_count: AtomicUsize,
    /// Total rows returned across all queries
    rows_returned: AtomicUsize,
    /// Collector creation time
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new collector with zeroed counters
    pub fn new() -> Self {
        Self {
            write_count: AtomicUsize::new(0),
            write_error_count: AtomicUsize::new(0),
            query_count: AtomicUsize::new(0),
            query_error_count: AtomicUsize::new(0),
            rows_returned: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful write
    pub fn increment_writes(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed write
    pub fn increment_write_errors(&self) {
        self.write_error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a started query
    pub fn increment_queries(&self) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed query
    pub fn increment_query_errors(&self) {
        self.query_error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record rows returned by a completed query
    pub fn add_rows_returned(&self, rows: usize) {
        self.rows_returned.fetch_add(rows, Ordering::Relaxed);
    }

    /// Snapshot the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count.load(Ordering::Relaxed),
            write_error_count: self.write_error_count.load(Ordering::Relaxed),
            query_count: self.query_count.load(Ordering::Relaxed),
            query_error_count: self.query_error_count.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            uptime: self.start_time.elapsed(),
        }
    }
}

/// Point-in-time view of the collector
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Number of successful writes
    pub write_count: usize,
    /// Number of failed writes
    pub write_error_count: usize,
    /// Number of queries started
    pub query_count: usize,
    /// Number of failed queries
    pub query_error_count: usize,
    /// Total rows returned across all queries
    pub rows_returned: usize,
    /// Time since the collector was created
    pub uptime: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MetricsCollector::new();
        metrics.increment_writes();
        metrics.increment_writes();
        metrics.increment_write_errors();
        metrics.increment_queries();
        metrics.add_rows_returned(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_count, 2);
        assert_eq!(snapshot.write_error_count, 1);
        assert_eq!(snapshot.query_count, 1);
        assert_eq!(snapshot.query_error_count, 0);
        assert_eq!(snapshot.rows_returned, 7);
    }
}
