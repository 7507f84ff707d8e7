//! Series error types
//!
//! Defines all error conditions the bucket calendar and series aggregator
//! can signal. Input problems are detected before any store query runs.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::storage::types::TIMESTAMP_FORMAT;

/// Errors that can occur while building a series
#[derive(Error, Debug)]
pub enum SeriesError {
    /// Grouping key is not one of `hour`, `day`, `month`
    #[error("Invalid granularity: {0:?} (expected hour, day or month)")]
    InvalidGranularity(String),

    /// Range start lies after its end
    #[error("Invalid time range: start {} is after end {}", .start.format(TIMESTAMP_FORMAT), .end.format(TIMESTAMP_FORMAT))]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The event store could not execute the grouped query
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] crate::storage::StoreError),

    /// Blocking series build failed or was cancelled
    #[error("Series task failed: {0}")]
    Task(String),
}

/// Result type for series operations
pub type SeriesResult<T> = Result<T, SeriesError>;
