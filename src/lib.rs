//! # Tally
//!
//! Time-bucketed sums over a store of timestamped events.
//!
//! A query names a closed range and a granularity (hour, day or month). The
//! answer is a dense series: one label per bucket of the range, in order,
//! with the sum of the events in that bucket or `0` when there were none.
//!
//! ## Modules
//!
//! - [`storage`]: Event store trait with SQLite and in-memory backends
//! - [`series`]: Bucket calendar and gap-filling aggregation
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: Tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally::series::{Granularity, SeriesAggregator};
//! use tally::storage::{SqliteEventStore, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteEventStore::open("./tally.db")?);
//!     let aggregator = SeriesAggregator::new(store);
//!
//!     let range = TimeRange::parse("2022-09-01T00:00:00", "2022-12-31T23:59:00")?;
//!     let series = aggregator.aggregate(range, Granularity::Month).await?;
//!
//!     for (bucket, sum) in series.iter() {
//!         println!("{bucket}: {sum}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod series;
pub mod storage;

pub use series::{Granularity, Series, SeriesAggregator, SeriesError};
pub use storage::{EventRecord, EventStore, StoreError, TimeRange};
