//! # Aggregation Windows
//!
//! A window is a half-open UTC time range `[start, end)` that dashboard
//! queries are evaluated over.
//!
//! ## Presets
//! ```text
//! ┌─────────────────┬──────────────────────────────────────────────────────┐
//! │ Preset          │ Range (UTC, `now` = 2024-03-15T14:00Z)               │
//! ├─────────────────┼──────────────────────────────────────────────────────┤
//! │ Today           │ 2024-03-15 00:00 .. 2024-03-16 00:00                 │
//! │ CurrentMonth    │ 2024-03-01 00:00 .. 2024-04-01 00:00                 │
//! │ Last7Days       │ 2024-03-09 00:00 .. 2024-03-16 00:00                 │
//! │ Last3Months     │ 2023-12-16 00:00 .. 2024-03-16 00:00  (91 days)      │
//! │ AllTime         │ 1970-01-01 00:00 .. 9999-12-31 00:00                 │
//! └─────────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! Expenses carry a calendar date, not a timestamp. An expense belongs to a
//! window when midnight UTC of its date falls inside the window.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Windows spanning at most this many days get daily buckets.
pub const MAX_DAILY_BUCKET_DAYS: i64 = 366;

// =============================================================================
// Aggregation Window
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregationWindow {
    /// Inclusive.
    #[ts(as = "String")]
    pub start: DateTime<Utc>,

    /// Exclusive.
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl AggregationWindow {
    /// Builds an explicit window. `start` must be strictly before `end`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start >= end {
            return Err(CoreError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window covering whole calendar days `[first, last]`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> CoreResult<Self> {
        Self::between(midnight(first), midnight(next_day(last)))
    }

    #[inline]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Whether an expense dated `date` falls in this window.
    #[inline]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(midnight(date))
    }

    /// Calendar-date bounds `[from, to)` equivalent to [`contains_date`].
    ///
    /// [`contains_date`]: AggregationWindow::contains_date
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (
            first_date_at_or_after(self.start),
            first_date_at_or_after(self.end),
        )
    }

    /// Number of calendar days the window touches.
    pub fn span_days(&self) -> i64 {
        let first = self.start.date_naive();
        let last = self.last_date();
        (last - first).num_days() + 1
    }

    /// Calendar date of the last instant inside the window.
    pub fn last_date(&self) -> NaiveDate {
        let end_date = self.end.date_naive();
        if self.end == midnight(end_date) {
            end_date.pred_opt().unwrap_or(end_date)
        } else {
            end_date
        }
    }

    /// Every calendar date the window touches, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_date();
        self.start
            .date_naive()
            .iter_days()
            .take_while(move |d| *d <= last)
    }
}

impl fmt::Display for AggregationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

// =============================================================================
// Window Presets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum WindowPreset {
    Today,
    CurrentMonth,
    Last7Days,
    Last3Months,
    AllTime,
}

impl WindowPreset {
    pub const ALL: [WindowPreset; 5] = [
        WindowPreset::Today,
        WindowPreset::CurrentMonth,
        WindowPreset::Last7Days,
        WindowPreset::Last3Months,
        WindowPreset::AllTime,
    ];

    /// Resolves the preset against `now`. Day boundaries are UTC.
    pub fn resolve(self, now: DateTime<Utc>) -> AggregationWindow {
        let today = now.date_naive();
        let tomorrow = midnight(next_day(today));

        let start = match self {
            WindowPreset::Today => midnight(today),
            WindowPreset::CurrentMonth => midnight(first_of_month(today)),
            WindowPreset::Last7Days => midnight(days_before(today, 6)),
            WindowPreset::Last3Months => midnight(days_before(today, 90)),
            WindowPreset::AllTime => {
                return AggregationWindow {
                    start: midnight(all_time_start()),
                    end: midnight(all_time_end()),
                }
            }
        };

        let end = match self {
            WindowPreset::CurrentMonth => midnight(
                first_of_month(today)
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX),
            ),
            _ => tomorrow,
        };

        AggregationWindow { start, end }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowPreset::Today => "today",
            WindowPreset::CurrentMonth => "current-month",
            WindowPreset::Last7Days => "last-7-days",
            WindowPreset::Last3Months => "last-3-months",
            WindowPreset::AllTime => "all-time",
        }
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(WindowPreset::Today),
            "month" | "current-month" => Ok(WindowPreset::CurrentMonth),
            "week" | "last-7-days" => Ok(WindowPreset::Last7Days),
            "quarter" | "last-3-months" => Ok(WindowPreset::Last3Months),
            "all" | "all-time" => Ok(WindowPreset::AllTime),
            other => Err(CoreError::UnknownPreset(other.to_string())),
        }
    }
}

// =============================================================================
// Date Helpers
// =============================================================================

/// Midnight UTC at the start of `date`.
#[inline]
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First day of the month containing `date`.
#[inline]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn first_date_at_or_after(ts: DateTime<Utc>) -> NaiveDate {
    let date = ts.date_naive();
    if ts == midnight(date) {
        date
    } else {
        next_day(date)
    }
}

fn all_time_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn all_time_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

// =============================================================================
// Unit Tests
// =============================================================================
