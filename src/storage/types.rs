//! Core data types shared by the event stores and the series aggregator
//!
//! - `Bucket`: canonical start timestamp of one granularity-sized interval
//! - `TimeRange`: inclusive `[start, end]` interval for queries
//! - `EventRecord`: a single timestamped numeric event
//! - `BucketedSum`: one row of a store's grouped-sum query

use chrono::NaiveDateTime;

/// Wire format for timestamps: ISO 8601, second precision, no offset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a timestamp in [`TIMESTAMP_FORMAT`]
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

/// Format a timestamp in [`TIMESTAMP_FORMAT`]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Start of one bucket
///
/// Identity, equality and ordering are those of the wrapped timestamp, so
/// buckets can key a map directly without going through strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket(NaiveDateTime);

impl Bucket {
    pub fn new(start: NaiveDateTime) -> Self {
        Self(start)
    }

    /// The timestamp this bucket starts at
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }

    /// ISO 8601 label used in series output
    pub fn label(&self) -> String {
        format_timestamp(&self.0)
    }
}

impl From<NaiveDateTime> for Bucket {
    fn from(start: NaiveDateTime) -> Self {
        Self(start)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Inclusive time interval for queries
///
/// Construction does not validate ordering; the aggregator rejects
/// `start > end` before touching a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parse both ends from [`TIMESTAMP_FORMAT`] strings
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(parse_timestamp(start)?, parse_timestamp(end)?))
    }

    /// `start <= end`
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Check if a timestamp falls within this range (inclusive on both ends)
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}]",
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT)
        )
    }
}

/// A single timestamped event
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl EventRecord {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Total of all event values in one bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketedSum {
    pub bucket: Bucket,
    pub sum: f64,
}

impl BucketedSum {
    pub fn new(bucket: Bucket, sum: f64) -> Self {
        Self { bucket, sum }
    }
}
