//! Request date ranges and the archive's temporal bounds.
//!
//! A date range is given as `YYYY-MM-DD/YYYY-MM-DD`. Both dates resolve to
//! 00:00 UTC and the hourly series covers `[start, end)`, so a one-day range
//! such as `2020-02-01/2020-02-02` yields 24 hourly values. The same string
//! is handed unchanged to the station network, whose reference-time
//! intervals are also end-exclusive.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format of both halves of a range.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Milliseconds in one hour.
pub const HOUR_MS: i64 = 3_600_000;

/// Spacing of samples in the dense archive.
pub const HALF_HOUR_MINUTES: i64 = 30;

/// Errors raised while parsing a date range.
#[derive(Debug, Error, PartialEq)]
pub enum DateRangeError {
    /// Not two ISO dates separated by a single `/`.
    #[error("Invalid date range '{0}': expected YYYY-MM-DD/YYYY-MM-DD")]
    InvalidFormat(String),

    /// Start date falls after end date.
    #[error("Invalid date range: start {start} is after end {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

/// First and last half-hour timestamps present in the dense archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveBounds {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl ArchiveBounds {
    pub fn new(min: DateTime<Utc>, max: DateTime<Utc>) -> Self {
        Self { min, max }
    }

    /// Number of half-hour samples from `min` to `max` inclusive.
    pub fn half_hour_count(&self) -> usize {
        ((self.max - self.min).num_minutes() / HALF_HOUR_MINUTES + 1).max(0) as usize
    }
}

impl fmt::Display for ArchiveBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.min.format("%Y-%m-%dT%H:%MZ"),
            self.max.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

/// A validated `[start, end)` range of whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn parse_date(part: &str, whole: &str) -> Result<NaiveDate, DateRangeError> {
    // chrono accepts single-digit months and days; the wire format does not.
    if part.len() != 10 {
        return Err(DateRangeError::InvalidFormat(whole.to_string()));
    }
    NaiveDate::parse_from_str(part, DATE_FORMAT)
        .map_err(|_| DateRangeError::InvalidFormat(whole.to_string()))
}

impl DateRange {
    /// Parse `YYYY-MM-DD/YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self, DateRangeError> {
        let mut parts = s.split('/');
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DateRangeError::InvalidFormat(s.to_string()));
        };
        let start = parse_date(start, s)?;
        let end = parse_date(end, s)?;
        Self::from_dates(start, end)
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Reversed { start, end });
        }
        Ok(Self {
            start: midnight(start),
            end: midnight(end),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_unix(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of hourly values the range produces.
    pub fn hours(&self) -> usize {
        (self.end - self.start).num_hours() as usize
    }

    /// Epoch milliseconds of every hour in `[start, end)`.
    pub fn hourly_timestamps(&self) -> Vec<i64> {
        let first = self.start.timestamp_millis();
        (0..self.hours() as i64).map(|h| first + h * HOUR_MS).collect()
    }

    /// Every half-hour from `start` to `end + 23h30`, inclusive.
    ///
    /// This is the full extent of the archive's labelled days, including the
    /// 47 samples following the end date's midnight.
    pub fn half_hour_boundaries(&self) -> Vec<DateTime<Utc>> {
        let last = self.end + Duration::minutes(23 * 60 + HALF_HOUR_MINUTES);
        step_half_hours(self.start, last, true)
    }

    /// The half-hour slots summed into the hourly series: `[start, end)`.
    pub fn half_hour_slots(&self) -> Vec<DateTime<Utc>> {
        step_half_hours(self.start, self.end, false)
    }

    /// Last half-hour slot read from the archive, or `None` for an empty range.
    pub fn last_slot(&self) -> Option<DateTime<Utc>> {
        (self.end > self.start).then(|| self.end - Duration::minutes(HALF_HOUR_MINUTES))
    }

    /// Whether the archive can serve this range.
    ///
    /// `None` means the bounds could not be discovered; that is reported as
    /// an invalid range rather than an error.
    pub fn is_valid(&self, bounds: Option<&ArchiveBounds>) -> bool {
        let Some(bounds) = bounds else {
            return false;
        };
        self.start <= self.end && self.start >= bounds.min && self.end <= bounds.max
    }
}

fn step_half_hours(from: DateTime<Utc>, to: DateTime<Utc>, inclusive: bool) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(HALF_HOUR_MINUTES);
    let mut out = Vec::new();
    let mut t = from;
    while t < to || (inclusive && t == to) {
        out.push(t);
        t += step;
    }
    out
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl std::str::FromStr for DateRange {
    type Err = DateRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
