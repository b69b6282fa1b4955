//! Local calendar month boundaries expressed as UTC instants.
//!
//! The local calendar is defined by a fixed minute offset from UTC. No DST
//! rules are applied; callers pick the offset that is correct for the month
//! they ask about.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::{Error, Result};

/// Largest accepted offset magnitude (one minute short of a day).
pub const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Pacific standard time, the offset used when none is configured.
pub const DEFAULT_OFFSET_MINUTES: i32 = -480;

/// Fixed offset from UTC in minutes, positive east of Greenwich.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TzOffset(i32);

impl TzOffset {
    /// Returns `None` when the offset is a day or more away from UTC.
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        (-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES)
            .contains(&minutes)
            .then_some(Self(minutes))
    }

    pub fn minutes(self) -> i32 {
        self.0
    }

    /// Wall-clock time at this offset for a UTC instant.
    pub fn to_local(self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() + TimeDelta::minutes(i64::from(self.0))
    }

    /// UTC instant for a wall-clock time at this offset.
    pub fn to_utc(self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - TimeDelta::minutes(i64::from(self.0))).and_utc()
    }
}

impl Default for TzOffset {
    fn default() -> Self {
        Self(DEFAULT_OFFSET_MINUTES)
    }
}

/// Half-open UTC range `[start, end)` covering one local calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
    pub offset: TzOffset,
}

impl MonthWindow {
    /// Window for an explicit month. Rejects years outside 1..=9999 and
    /// months outside 1..=12.
    pub fn for_month(year: i32, month: u32, offset: TzOffset) -> Option<Self> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Self::build(year, month, offset)
    }

    /// Window for the local month containing `now`.
    pub fn current(now: DateTime<Utc>, offset: TzOffset) -> Result<Self> {
        let local = offset.to_local(now);
        Self::build(local.year(), local.month(), offset)
            .ok_or_else(|| Error::Internal(format!("No month window for {}", now)))
    }

    /// Apply an optional `(year, month)` override.
    ///
    /// A valid year without a month selects the current local month of that
    /// year. A month without a year, or any out-of-range value, is ignored and
    /// the current month is used instead.
    pub fn resolve(
        now: DateTime<Utc>,
        offset: TzOffset,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Self> {
        let requested = match (year, month) {
            (Some(year), Some(month)) => Self::for_month(year, month, offset),
            (Some(year), None) => Self::for_month(year, offset.to_local(now).month(), offset),
            _ => None,
        };

        match requested {
            Some(window) => Ok(window),
            None => Self::current(now, offset),
        }
    }

    fn build(year: i32, month: u32, offset: TzOffset) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            start: offset.to_utc(first.and_time(NaiveTime::MIN)),
            end: offset.to_utc(next.and_time(NaiveTime::MIN)),
            year,
            month,
            offset,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// `YYYY-MM`
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// First local day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.offset.to_local(self.start).date()
    }

    /// First local day of the following month.
    pub fn next_first_day(&self) -> NaiveDate {
        self.offset.to_local(self.end).date()
    }
}
