//! Bucket granularity
//!
//! A granularity fixes three things:
//!
//! - how a timestamp is truncated to its bucket start
//! - the string key a store groups by (`%Y-%m-%dT%H`, `%Y-%m-%d`, `%Y-%m`)
//! - how the bucket calendar steps from one bucket to the next

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::str::FromStr;

use crate::series::error::{SeriesError, SeriesResult};
use crate::storage::types::Bucket;

/// Grouping unit for a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One bucket per hour
    Hour,
    /// One bucket per day
    Day,
    /// One bucket per calendar month
    Month,
}

impl Granularity {
    /// All granularities, finest first
    pub fn all() -> &'static [Granularity] {
        &[Granularity::Hour, Granularity::Day, Granularity::Month]
    }

    /// Parse the literal group type names `hour`, `day` and `month`
    pub fn parse(s: &str) -> SeriesResult<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            other => Err(SeriesError::InvalidGranularity(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    /// strftime pattern of the key a store groups events by
    pub fn key_format(&self) -> &'static str {
        match self {
            Self::Hour => "%Y-%m-%dT%H",
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
        }
    }

    /// Text appended to a grouping key to form a full timestamp
    fn key_suffix(&self) -> &'static str {
        match self {
            Self::Hour => ":00:00",
            Self::Day => "T00:00:00",
            Self::Month => "-01T00:00:00",
        }
    }

    /// Grouping key for a timestamp, e.g. `2022-09` for months
    pub fn bucket_key(&self, ts: NaiveDateTime) -> String {
        ts.format(self.key_format()).to_string()
    }

    /// Normalize a store grouping key back to its bucket
    ///
    /// `"2022-09"` at month granularity becomes `2022-09-01T00:00:00`.
    /// Returns `None` if the key is not a key of this granularity.
    pub fn bucket_from_key(&self, key: &str) -> Option<Bucket> {
        let full = format!("{}{}", key, self.key_suffix());
        crate::storage::types::parse_timestamp(&full)
            .ok()
            .map(Bucket::new)
    }

    /// Truncate a timestamp to the start of its bucket
    pub fn truncate(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let truncated = match self {
            Self::Hour => ts
                .with_minute(0)
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_nanosecond(0)),
            Self::Day => ts.date().and_hms_opt(0, 0, 0),
            Self::Month => ts.date().with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };

        truncated.unwrap_or(ts)
    }

    /// Width of the bucket starting at `current`
    ///
    /// Hours and days are fixed (a day is always 24 hours). A month step is
    /// the number of days in `current`'s calendar month, so it only lands on
    /// the 1st of the next month when `current` is itself a 1st.
    pub fn step(&self, current: NaiveDateTime) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
            Self::Month => Duration::days(days_in_month(current.year(), current.month())),
        }
    }

    /// Bucket following `current`, `None` past the representable range
    pub fn next(&self, current: NaiveDateTime) -> Option<NaiveDateTime> {
        current.checked_add_signed(self.step(current))
    }
}

/// Number of days in the given calendar month
pub fn days_in_month(year: i32, month: u32) -> i64 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next_first)) => (next_first - first).num_days(),
        // December of the last representable year
        _ => 31,
    }
}

impl FromStr for Granularity {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_parse_literal_names_only() {
        assert_eq!(Granularity::parse("hour").unwrap(), Granularity::Hour);
        assert_eq!(Granularity::parse("day").unwrap(), Granularity::Day);
        assert_eq!("month".parse::<Granularity>().unwrap(), Granularity::Month);

        for bad in ["week", "HOUR", "h", "", " day"] {
            assert!(
                matches!(Granularity::parse(bad), Err(SeriesError::InvalidGranularity(ref s)) if s == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_matches_parse() {
        for g in Granularity::all() {
            assert_eq!(Granularity::parse(&g.to_string()).unwrap(), *g);
        }
        assert_eq!(Granularity::Hour.to_string(), "hour");
    }

    #[test]
    fn test_truncate() {
        let t = ts("2024-01-15T14:35:42");
        assert_eq!(Granularity::Hour.truncate(t), ts("2024-01-15T14:00:00"));
        assert_eq!(Granularity::Day.truncate(t), ts("2024-01-15T00:00:00"));
        assert_eq!(Granularity::Month.truncate(t), ts("2024-01-01T00:00:00"));
    }

    #[test]
    fn test_bucket_key_round_trips_to_truncation() {
        let t = ts("2022-09-17T08:45:10");
        for g in Granularity::all() {
            let key = g.bucket_key(t);
            let bucket = g.bucket_from_key(&key).unwrap();
            assert_eq!(bucket.start(), g.truncate(t), "granularity {g}");
        }

        assert_eq!(Granularity::Month.bucket_key(t), "2022-09");
        assert_eq!(Granularity::Day.bucket_key(t), "2022-09-17");
        assert_eq!(Granularity::Hour.bucket_key(t), "2022-09-17T08");
    }

    #[test]
    fn test_bucket_from_key_rejects_foreign_keys() {
        assert!(Granularity::Month.bucket_from_key("2022-09-17").is_none());
        assert!(Granularity::Hour.bucket_from_key("2022-09").is_none());
        assert!(Granularity::Day.bucket_from_key("garbage").is_none());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2022, 1), 31);
        assert_eq!(days_in_month(2022, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2022, 4), 30);
        assert_eq!(days_in_month(2022, 12), 31);
    }

    #[test]
    fn test_month_step_uses_current_month_length() {
        assert_eq!(
            Granularity::Month.next(ts("2022-09-01T00:00:00")),
            Some(ts("2022-10-01T00:00:00"))
        );
        assert_eq!(
            Granularity::Month.next(ts("2022-02-01T00:00:00")),
            Some(ts("2022-03-01T00:00:00"))
        );
        // Mid-month starts drift: Jan 31 + 31 days lands in March
        assert_eq!(
            Granularity::Month.next(ts("2022-01-31T00:00:00")),
            Some(ts("2022-03-03T00:00:00"))
        );
    }

    #[test]
    fn test_fixed_steps() {
        assert_eq!(
            Granularity::Hour.next(ts("2022-09-01T23:00:00")),
            Some(ts("2022-09-02T00:00:00"))
        );
        assert_eq!(
            Granularity::Day.next(ts("2022-12-31T06:30:00")),
            Some(ts("2023-01-01T06:30:00"))
        );
    }
}
