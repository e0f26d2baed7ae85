//! Calendar types for reporting and projection
//!
//! Cash-flow projections and dashboard aggregates are bucketed by calendar
//! month. This module provides the month key used for bucketing and the
//! inclusive date range used for reporting periods and projection horizons.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Invalid period: spans {months} months, at most {max} allowed")]
    SpanTooLong { months: u32, max: u32 },

    #[error("Invalid month key: {0}")]
    InvalidMonth(String),

    #[error("Date out of range")]
    OutOfRange,
}

/// A calendar month, ordered chronologically
///
/// Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a month key, validating the month number
    pub fn new(year: i32, month: u32) -> Result<Self, TemporalError> {
        if !(1..=12).contains(&month) {
            return Err(TemporalError::InvalidMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month key always holds a valid month")
    }

    /// Last day of the month
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    /// The following month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Number of months from `self` to `other`, inclusive of both ends.
    /// Returns 0 when `other` precedes `self`.
    pub fn months_through(&self, other: &MonthKey) -> u32 {
        let diff = (other.year - self.year) * 12 + other.month as i32 - self.month as i32;
        if diff < 0 {
            0
        } else {
            diff as u32 + 1
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| TemporalError::InvalidMonth(s.to_string()))?;
        let year = year
            .parse()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        let month = month
            .parse()
            .map_err(|_| TemporalError::InvalidMonth(s.to_string()))?;
        MonthKey::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An inclusive date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The range covering `months` calendar months forward from `start`
    pub fn months_ahead(start: NaiveDate, months: u32) -> Result<Self, TemporalError> {
        let end = start
            .checked_add_months(Months::new(months))
            .ok_or(TemporalError::OutOfRange)?;
        Self::new(start, end)
    }

    /// The whole calendar month
    pub fn of_month(month: MonthKey) -> Self {
        Self {
            start: month.first_day(),
            end: month.last_day(),
        }
    }

    /// Returns true if `date` falls in the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar months the range touches
    pub fn month_count(&self) -> u32 {
        MonthKey::of(self.start).months_through(&MonthKey::of(self.end))
    }

    /// Rejects ranges touching more than `max` calendar months
    pub fn within_months(self, max: u32) -> Result<Self, TemporalError> {
        let months = self.month_count();
        if months > max {
            return Err(TemporalError::SpanTooLong { months, max });
        }
        Ok(self)
    }

    /// Calendar months touched by the range, in order
    pub fn months(&self) -> Vec<MonthKey> {
        let first = MonthKey::of(self.start);
        let last = MonthKey::of(self.end);
        let mut months = Vec::with_capacity(first.months_through(&last) as usize);
        let mut current = first;
        while current <= last {
            months.push(current);
            current = current.next();
        }
        months
    }
}
