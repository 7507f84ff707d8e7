//! Series Aggregator
//!
//! Produces a dense series for `(range, granularity)`:
//!
//! ```text
//! validate → store.grouped_sum → BucketCalendar walk + lookup by bucket → Series
//! ```
//!
//! The store only reports buckets that received events; every calendar
//! bucket without a store row is filled with `0`.
//!
//! The calendar walk is proportional to the range length, so it runs on the
//! blocking pool. Dropping the `aggregate` future stops the walk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;

use crate::series::calendar::BucketCalendar;
use crate::series::error::{SeriesError, SeriesResult};
use crate::series::granularity::Granularity;
use crate::storage::{Bucket, BucketedSum, EventStore, TimeRange};

/// Buckets filled between checks of the cancel flag
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Dense, index-aligned series of bucket labels and sums
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Bucket starts, strictly increasing
    pub labels: Vec<Bucket>,
    /// Sum for each label, `0` for buckets without events
    pub dataset: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate `(bucket, sum)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, f64)> + '_ {
        self.labels.iter().copied().zip(self.dataset.iter().copied())
    }

    /// Sum for a specific bucket, if it is part of the series
    pub fn get(&self, bucket: Bucket) -> Option<f64> {
        self.labels
            .binary_search(&bucket)
            .ok()
            .map(|idx| self.dataset[idx])
    }

    /// Labels in wire format
    pub fn label_strings(&self) -> Vec<String> {
        self.labels.iter().map(Bucket::label).collect()
    }

    /// Sum over the whole series
    pub fn total(&self) -> f64 {
        self.dataset.iter().sum()
    }
}

/// Store rows keyed by bucket, duplicates added together
fn sum_lookup(rows: &[BucketedSum]) -> HashMap<Bucket, f64> {
    let mut lookup: HashMap<Bucket, f64> = HashMap::with_capacity(rows.len());
    for row in rows {
        *lookup.entry(row.bucket).or_insert(0.0) += row.sum;
    }
    lookup
}

/// Merge sparse store rows into the dense calendar sequence
///
/// Rows whose bucket is not part of `calendar` are dropped. Duplicate rows
/// for the same bucket are added together.
pub fn merge_dense(calendar: &[Bucket], rows: &[BucketedSum]) -> Series {
    let lookup = sum_lookup(rows);

    let dataset = calendar
        .iter()
        .map(|bucket| lookup.get(bucket).copied().unwrap_or(0.0))
        .collect();

    Series {
        labels: calendar.to_vec(),
        dataset,
    }
}

/// Walk `calendar` and gap-fill from `rows`
///
/// Returns `None` once `cancel` is set.
fn fill_series(
    calendar: BucketCalendar,
    rows: &[BucketedSum],
    cancel: &AtomicBool,
) -> Option<Series> {
    let lookup = sum_lookup(rows);
    let mut labels = Vec::new();
    let mut dataset = Vec::new();

    for (idx, bucket) in calendar.iter().enumerate() {
        if idx % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
        labels.push(bucket);
        dataset.push(lookup.get(&bucket).copied().unwrap_or(0.0));
    }

    Some(Series { labels, dataset })
}

/// Sets the shared flag when dropped
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Builds dense series from an injected event store
///
/// Holds no per-call state; a single aggregator can serve concurrent
/// requests.
pub struct SeriesAggregator {
    store: Arc<dyn EventStore>,
}

impl SeriesAggregator {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// The store this aggregator queries
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Build the dense series for `range` at `granularity`
    ///
    /// Fails with `InvalidRange` before querying the store if
    /// `range.start > range.end`. Store failures are returned as
    /// `StoreUnavailable` without retrying.
    pub async fn aggregate(&self, range: TimeRange, granularity: Granularity) -> SeriesResult<Series> {
        let started = Instant::now();

        let calendar = BucketCalendar::new(range, granularity)?;

        let rows = self.store.grouped_sum(range, granularity).await?;
        if !rows.windows(2).all(|w| w[0].bucket <= w[1].bucket) {
            tracing::warn!(
                store = self.store.name(),
                "grouped sum rows not sorted by bucket"
            );
        }
        let store_rows = rows.len();

        let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
        let flag = Arc::clone(&cancel.0);
        let series = tokio::task::spawn_blocking(move || fill_series(calendar, &rows, &flag))
            .await
            .map_err(|e| SeriesError::Task(e.to_string()))?
            .ok_or_else(|| SeriesError::Task("series build cancelled".to_string()))?;
        drop(cancel);

        tracing::debug!(
            range = %range,
            granularity = %granularity,
            buckets = series.len(),
            store_rows,
            elapsed_us = started.elapsed().as_micros() as u64,
            "aggregated series"
        );

        Ok(series)
    }

    /// Like [`aggregate`](Self::aggregate), parsing the group type first
    ///
    /// An unknown `group_type` fails with `InvalidGranularity` before the
    /// store is touched.
    pub async fn aggregate_with(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        group_type: &str,
    ) -> SeriesResult<Series> {
        let granularity = Granularity::parse(group_type)?;
        self.aggregate(TimeRange::new(start, end), granularity).await
    }
}
