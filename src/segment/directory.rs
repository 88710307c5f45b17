//! The segment directory
//!
//! Authoritative record of segment boundaries. All writers and readers go
//! through here: writes to resolve the segment that must receive an entry
//! stamped "now", queries to resolve the set of segments overlapping a time
//! range.
//!
//! Rotation is serialized through a conditional seal: flipping the open
//! row's `end` from null is the claim on creating the successor, so two
//! writers observing the same expired segment produce exactly one new one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::SinkConfig;
use crate::store::{DocumentStore, Filter, FindOptions, IndexSpec, StoreResult};

use super::{LogSplit, SegmentError, SegmentMeta, SegmentName, SegmentResult};

/// Rotation claim attempts before giving up. Each lost claim means another
/// writer made progress, so exhaustion indicates a pathological store.
const CLAIM_ATTEMPTS: usize = 4;

/// Maintains the metadata collection listing every segment.
pub struct SegmentDirectory {
    store: Arc<dyn DocumentStore>,
    meta_collection: String,
    prefix: String,
    split: LogSplit,
    extra_indexes: Vec<IndexSpec>,
    init: OnceCell<()>,
}

impl SegmentDirectory {
    /// Create a directory over `store` configured by `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: &SinkConfig) -> Self {
        Self {
            store,
            meta_collection: config.meta_collection_name.clone(),
            prefix: config.log_collection_prefix.clone(),
            split: config.log_split,
            extra_indexes: config.additional_log_indexes.clone(),
            init: OnceCell::new(),
        }
    }

    /// The configured split policy.
    pub fn split(&self) -> LogSplit {
        self.split
    }

    /// Idempotent one-time provisioning of the metadata collection.
    /// Concurrent callers share a single initialization; a failure is
    /// surfaced to every waiter and retried on the next call.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        self.init
            .get_or_try_init(|| self.provision_meta())
            .await
            .map(|_| ())
    }

    async fn provision_meta(&self) -> StoreResult<()> {
        let existing = self
            .store
            .list_collections(Some(self.meta_collection.as_str()))
            .await?;
        if !existing.is_empty() {
            return Ok(());
        }
        self.store.create_collection(&self.meta_collection).await?;
        self.store
            .create_indexes(
                &self.meta_collection,
                &[
                    IndexSpec::ascending("name").unique(),
                    IndexSpec::descending("start").unique(),
                    IndexSpec::descending("end").unique(),
                ],
            )
            .await?;
        info!(collection = %self.meta_collection, "provisioned segment directory");
        Ok(())
    }

    /// The row with `end = null`, if any. The unique index on `end`
    /// guarantees at most one.
    pub async fn find_open_segment(&self) -> SegmentResult<Option<SegmentMeta>> {
        let row = self
            .store
            .find_one(&self.meta_collection, &Filter::is_null("end"))
            .await?;
        row.map(SegmentMeta::from_document)
            .transpose()
            .map_err(Into::into)
    }

    /// Resolve the segment that must receive a write stamped `now`,
    /// rotating first if the open segment has expired under the split
    /// policy.
    pub async fn resolve_write_segment(&self, now: DateTime<Utc>) -> SegmentResult<SegmentName> {
        for _ in 0..CLAIM_ATTEMPTS {
            let open = self.find_open_segment().await?;
            if let Some(meta) = &open {
                if self.split.is_valid(meta.start, now) {
                    return Ok(meta.name.clone());
                }
            }

            if let Some(meta) = open {
                // Seal-and-claim: only the writer that flips end from null
                // wins the right to create the successor.
                let report = self
                    .store
                    .update_one(
                        &self.meta_collection,
                        &Filter::and(vec![
                            Filter::eq("name", meta.name.as_str()),
                            Filter::is_null("end"),
                        ]),
                        json!({ "end": now.timestamp_millis() }),
                    )
                    .await?;
                if report.matched == 0 {
                    debug!(segment = %meta.name, "lost rotation claim, re-resolving");
                    continue;
                }
                debug!(segment = %meta.name, end = now.timestamp_millis(), "sealed segment");
            }

            match self.create_segment(now).await {
                Ok(name) => return Ok(name),
                Err(SegmentError::Store(err)) if err.is_duplicate_key() => {
                    // Another writer inserted its row first (racing the very
                    // first segment, or a same-millisecond name collision).
                    debug!("segment creation raced, re-resolving");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(SegmentError::conflict(format!(
            "gave up after {} rotation attempts",
            CLAIM_ATTEMPTS
        )))
    }

    async fn create_segment(&self, now: DateTime<Utc>) -> SegmentResult<SegmentName> {
        // Epoch-millis suffix keeps names lexicographically and temporally
        // ordered.
        let name = format!("{}{}", self.prefix, now.timestamp_millis());
        self.store.create_collection(&name).await?;

        let mut indexes = vec![IndexSpec::ascending("timestamp")];
        indexes.extend(self.extra_indexes.iter().cloned());
        self.store.create_indexes(&name, &indexes).await?;

        let row = SegmentMeta::open(name.clone(), now);
        self.store
            .insert_one(&self.meta_collection, row.to_document()?)
            .await?;
        info!(segment = %name, start = now.timestamp_millis(), "opened segment");
        Ok(name)
    }

    /// Names of segments overlapping `[from, to]`, in directory order.
    /// Missing bounds default to the epoch and `now`. With no bounds at all
    /// every segment is returned unfiltered.
    ///
    /// An open segment starting after the range is still included so the
    /// live segment is never silently skipped.
    pub async fn resolve_query_segments(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SegmentResult<Vec<SegmentName>> {
        let filter = if from.is_none() && to.is_none() {
            Filter::All
        } else {
            let real_from = from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH).timestamp_millis();
            let real_to = to.unwrap_or(now).timestamp_millis();
            Filter::or(vec![
                Filter::and(vec![
                    Filter::gte("start", real_from),
                    Filter::lte("end", real_to),
                ]),
                Filter::and(vec![Filter::gte("start", real_from), Filter::is_null("end")]),
                Filter::and(vec![Filter::gte("start", real_to), Filter::is_null("end")]),
            ])
        };

        let options = FindOptions::default().with_projection(vec!["name".to_string()]);
        let rows = self.store.find(&self.meta_collection, &filter, &options).await?;
        rows.iter()
            .map(|row| {
                row.get("name")
                    .and_then(|name| name.as_str())
                    .map(str::to_owned)
                    .ok_or_else(|| SegmentError::meta("meta row missing name"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn directory(split: LogSplit) -> (SegmentDirectory, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = SinkConfig::default().with_log_split(split);
        let dir = SegmentDirectory::new(store.clone(), &config);
        (dir, store)
    }

    async fn open_rows(store: &MemoryStore) -> Vec<SegmentMeta> {
        store
            .find("meta", &Filter::is_null("end"), &FindOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|doc| SegmentMeta::from_document(doc).unwrap())
            .collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_initialization_is_idempotent_and_concurrent() {
        let (dir, store) = directory(LogSplit::None);

        let (a, b) = tokio::join!(dir.ensure_initialized(), dir.ensure_initialized());
        a.unwrap();
        b.unwrap();
        dir.ensure_initialized().await.unwrap();

        assert_eq!(store.list_collections(Some("meta")).await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_first_write_opens_a_segment() {
        let (dir, store) = directory(LogSplit::None);
        dir.ensure_initialized().await.unwrap();

        let name = dir.resolve_write_segment(at(0)).await.unwrap();
        assert_eq!(name, "log0");
        assert_eq!(store.list_collections(Some("log0")).await.unwrap().len(), 1);

        let open = open_rows(&store).await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, "log0");
        assert_eq!(open[0].start, at(0));
    }

    #[test_log::test(tokio::test)]
    async fn test_valid_open_segment_is_reused() {
        let (dir, _store) = directory(LogSplit::Day);
        dir.ensure_initialized().await.unwrap();

        let day1_morning = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let day1_evening = Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();

        let first = dir.resolve_write_segment(day1_morning).await.unwrap();
        let second = dir.resolve_write_segment(day1_evening).await.unwrap();
        assert_eq!(first, second);
    }

    #[test_log::test(tokio::test)]
    async fn test_rotation_seals_predecessor_at_new_start() {
        let (dir, store) = directory(LogSplit::Day);
        dir.ensure_initialized().await.unwrap();

        let day1 = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 1, 0).unwrap();

        let first = dir.resolve_write_segment(day1).await.unwrap();
        let second = dir.resolve_write_segment(day2).await.unwrap();
        assert_ne!(first, second);

        // Exactly one open row, and the seal meets the successor's start.
        let open = open_rows(&store).await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, second);

        let sealed = store
            .find_one("meta", &Filter::eq("name", first.as_str()))
            .await
            .unwrap()
            .map(SegmentMeta::from_document)
            .unwrap()
            .unwrap();
        assert_eq!(sealed.end, Some(day2));
        assert_eq!(sealed.end.unwrap(), open[0].start);
    }

    #[test_log::test(tokio::test)]
    async fn test_interval_rotation_is_inclusive_at_deadline() {
        let (dir, _store) = directory(LogSplit::Interval(500));
        dir.ensure_initialized().await.unwrap();

        let first = dir.resolve_write_segment(at(1_000)).await.unwrap();
        assert_eq!(first, dir.resolve_write_segment(at(1_500)).await.unwrap());

        let second = dir.resolve_write_segment(at(1_501)).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second, "log1501");
    }

    #[test_log::test(tokio::test)]
    async fn test_segment_names_are_ordered() {
        let (dir, _store) = directory(LogSplit::Interval(10));
        dir.ensure_initialized().await.unwrap();

        let mut names = Vec::new();
        for millis in [0, 100, 200, 300] {
            names.push(dir.resolve_write_segment(at(millis)).await.unwrap());
        }
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test_log::test(tokio::test)]
    async fn test_query_segments_without_bounds_returns_all() {
        let (dir, _store) = directory(LogSplit::Interval(10));
        dir.ensure_initialized().await.unwrap();

        for millis in [0, 100, 200] {
            dir.resolve_write_segment(at(millis)).await.unwrap();
        }
        let names = dir.resolve_query_segments(None, None, at(300)).await.unwrap();
        assert_eq!(names, vec!["log0", "log100", "log200"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_query_segments_selects_overlapping_range() {
        let (dir, _store) = directory(LogSplit::Interval(10));
        dir.ensure_initialized().await.unwrap();

        // Three segments: [0, 100], [100, 200], and an open one from 200.
        for millis in [0, 100, 200] {
            dir.resolve_write_segment(at(millis)).await.unwrap();
        }

        let names = dir
            .resolve_query_segments(Some(at(0)), Some(at(200)), at(250))
            .await
            .unwrap();
        assert_eq!(names, vec!["log0", "log100", "log200"]);

        // The open segment is included even when it starts past the range
        // start; sealed segments beginning before `from` are not selected.
        let names = dir
            .resolve_query_segments(Some(at(150)), Some(at(400)), at(450))
            .await
            .unwrap();
        assert_eq!(names, vec!["log200"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_query_segments_defaults_missing_bounds() {
        let (dir, _store) = directory(LogSplit::Interval(10));
        dir.ensure_initialized().await.unwrap();

        dir.resolve_write_segment(at(0)).await.unwrap();
        dir.resolve_write_segment(at(100)).await.unwrap();

        // Only `to` given: from defaults to the epoch.
        let names = dir
            .resolve_query_segments(None, Some(at(120)), at(130))
            .await
            .unwrap();
        assert_eq!(names, vec!["log0", "log100"]);

        // Only `from` given: to defaults to now.
        let names = dir
            .resolve_query_segments(Some(at(0)), None, at(130))
            .await
            .unwrap();
        assert_eq!(names, vec!["log0", "log100"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_concurrent_rotation_creates_one_segment() {
        let (dir, store) = directory(LogSplit::Interval(10));
        dir.ensure_initialized().await.unwrap();
        dir.resolve_write_segment(at(0)).await.unwrap();

        // Both writers observe the expired segment; the claim admits one
        // rotation and routes the loser to the winner's segment.
        let (a, b) = tokio::join!(
            dir.resolve_write_segment(at(100)),
            dir.resolve_write_segment(at(100))
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(open_rows(&store).await.len(), 1);
    }
}
