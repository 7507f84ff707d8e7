//! Tally Series Engine
//!
//! Turns sparse per-bucket sums from an event store into a dense series:
//!
//! - **Granularity**: hour / day / month bucketing rules
//! - **Calendar**: enumerate every bucket in a range
//! - **Aggregator**: query the store and gap-fill against the calendar
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::series::{Granularity, SeriesAggregator};
//! use tally::storage::{SqliteEventStore, TimeRange};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteEventStore::open("./tally.db")?);
//! let aggregator = SeriesAggregator::new(store);
//!
//! let range = TimeRange::parse("2022-09-01T00:00:00", "2022-12-31T23:59:00")?;
//! let series = aggregator.aggregate(range, Granularity::Month).await?;
//!
//! for (bucket, sum) in series.iter() {
//!     println!("{bucket}: {sum}");
//! }
//! ```

mod aggregator;
mod calendar;
mod error;
mod granularity;

pub use aggregator::{merge_dense, Series, SeriesAggregator};
pub use calendar::{bucket_range, BucketCalendar, CalendarIter};
pub use error::{SeriesError, SeriesResult};
pub use granularity::{days_in_month, Granularity};
