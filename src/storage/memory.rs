//! In-memory event store
//!
//! Keeps events in a `Vec` behind an async `RwLock` and groups them on read.
//! Useful for tests and for running the API without a database file.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::series::Granularity;
use crate::storage::error::StoreResult;
use crate::storage::store::EventStore;
use crate::storage::types::{Bucket, BucketedSum, EventRecord, TimeRange};

/// Event store held entirely in memory
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<EventRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `events`
    pub fn with_events(events: Vec<EventRecord>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    /// Number of stored events
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn grouped_sum(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> StoreResult<Vec<BucketedSum>> {
        let events = self.events.read().await;

        let mut sums: BTreeMap<Bucket, f64> = BTreeMap::new();
        for event in events.iter().filter(|e| range.contains(e.timestamp)) {
            let bucket = Bucket::new(granularity.truncate(event.timestamp));
            *sums.entry(bucket).or_insert(0.0) += event.value;
        }

        Ok(sums
            .into_iter()
            .map(|(bucket, sum)| BucketedSum::new(bucket, sum))
            .collect())
    }

    async fn append(&self, events: &[EventRecord]) -> StoreResult<usize> {
        self.events.write().await.extend_from_slice(events);
        Ok(events.len())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::parse_timestamp;

    fn event(dt: &str, value: f64) -> EventRecord {
        EventRecord::new(parse_timestamp(dt).unwrap(), value)
    }

    #[tokio::test]
    async fn test_grouped_sum_sorted_and_filtered() {
        let store = MemoryEventStore::with_events(vec![
            event("2022-09-02T05:00:00", 3.0),
            event("2022-09-01T23:00:00", 1.0),
            event("2022-09-01T01:00:00", 2.0),
            event("2022-08-31T23:59:59", 50.0),
        ]);

        let range = TimeRange::parse("2022-09-01T00:00:00", "2022-09-30T00:00:00").unwrap();
        let rows = store.grouped_sum(range, Granularity::Day).await.unwrap();

        let labels: Vec<String> = rows.iter().map(|r| r.bucket.label()).collect();
        assert_eq!(labels, vec!["2022-09-01T00:00:00", "2022-09-02T00:00:00"]);
        assert_eq!(rows[0].sum, 3.0);
        assert_eq!(rows[1].sum, 3.0);
    }

    #[tokio::test]
    async fn test_append() {
        let store = MemoryEventStore::new();
        assert!(store.is_empty().await);

        let n = store
            .append(&[event("2022-09-01T00:00:00", 1.0), event("2022-09-01T01:00:00", 1.0)])
            .await
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(store.len().await, 2);
        store.ping().await.unwrap();
    }
}
