//! Tally Event Stores
//!
//! This module provides the event store collaborators behind the series
//! aggregator:
//!
//! - **types**: Core data structures (Bucket, TimeRange, EventRecord, BucketedSum)
//! - **store**: The `EventStore` trait and its grouped-sum primitive
//! - **sqlite**: SQLite-backed store
//! - **memory**: In-memory store
//! - **error**: Error types
//!
//! # Read Path
//!
//! ```text
//! (range, granularity) → grouped_sum → [BucketedSum] (sparse, sorted)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tally::series::Granularity;
//! use tally::storage::{EventRecord, EventStore, SqliteEventStore, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteEventStore::open("./tally.db")?;
//!
//!     let range = TimeRange::parse("2022-09-01T00:00:00", "2022-12-31T23:59:00")?;
//!     store.append(&[EventRecord::new(range.start, 5.0)]).await?;
//!
//!     let rows = store.grouped_sum(range, Granularity::Month).await?;
//!     println!("{} non-empty buckets", rows.len());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryEventStore;
pub use sqlite::SqliteEventStore;
pub use store::EventStore;
pub use types::{
    format_timestamp, parse_timestamp, Bucket, BucketedSum, EventRecord, TimeRange,
    TIMESTAMP_FORMAT,
};
