//! Bucket Calendar
//!
//! Enumerates every bucket boundary from `start` to `end` (inclusive) for a
//! granularity. The walk begins at the literal `start`, which is not rounded
//! down to a boundary, and advances by [`Granularity::step`] until it passes
//! `end`.
//!
//! ```text
//! start=10:00 end=12:00 hour  →  10:00, 11:00, 12:00
//! start=09-01 end=12-31 month →  09-01, 10-01, 11-01, 12-01
//! start=01-31 end=04-30 month →  01-31, 03-03, 04-03
//! ```

use chrono::NaiveDateTime;

use crate::series::error::{SeriesError, SeriesResult};
use crate::series::granularity::Granularity;
use crate::storage::types::{Bucket, TimeRange};

/// Ordered, gap-free bucket sequence for one range and granularity
#[derive(Debug, Clone, Copy)]
pub struct BucketCalendar {
    range: TimeRange,
    granularity: Granularity,
}

impl BucketCalendar {
    /// Create a calendar, rejecting ranges whose start lies after their end
    pub fn new(range: TimeRange, granularity: Granularity) -> SeriesResult<Self> {
        if !range.is_valid() {
            return Err(SeriesError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }

        Ok(Self { range, granularity })
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Iterate the buckets lazily
    pub fn iter(&self) -> CalendarIter {
        CalendarIter {
            next: Some(self.range.start),
            end: self.range.end,
            granularity: self.granularity,
        }
    }

    /// Collect all buckets
    pub fn buckets(&self) -> Vec<Bucket> {
        self.iter().collect()
    }
}

impl IntoIterator for &BucketCalendar {
    type Item = Bucket;
    type IntoIter = CalendarIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the buckets of a [`BucketCalendar`]
#[derive(Debug, Clone)]
pub struct CalendarIter {
    next: Option<NaiveDateTime>,
    end: NaiveDateTime,
    granularity: Granularity,
}

impl Iterator for CalendarIter {
    type Item = Bucket;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|ts| *ts <= self.end)?;
        self.next = self.granularity.next(current);
        Some(Bucket::new(current))
    }
}

impl std::iter::FusedIterator for CalendarIter {}

/// Enumerate the buckets covering `[start, end]`
pub fn bucket_range(
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
) -> SeriesResult<Vec<Bucket>> {
    Ok(BucketCalendar::new(TimeRange::new(start, end), granularity)?.buckets())
}
