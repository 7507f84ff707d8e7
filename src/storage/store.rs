//! Event store abstraction
//!
//! The aggregator only ever calls [`EventStore::grouped_sum`]. Writes and the
//! health ping exist for the API boundary.

use async_trait::async_trait;

use crate::series::Granularity;
use crate::storage::error::StoreResult;
use crate::storage::types::{BucketedSum, EventRecord, TimeRange};

/// A store of timestamped numeric events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Short name used in logs and health output
    fn name(&self) -> &str;

    /// Sum event values per bucket for all events in `range` (inclusive)
    ///
    /// Returns one row per bucket holding at least one event, sorted
    /// ascending by bucket. Bucket keys are the event timestamps truncated
    /// to `granularity`.
    async fn grouped_sum(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> StoreResult<Vec<BucketedSum>>;

    /// Append events, returning how many were stored
    async fn append(&self, events: &[EventRecord]) -> StoreResult<usize>;

    /// Check that the store can serve queries
    async fn ping(&self) -> StoreResult<()>;
}
