//! Business-day timeline and lookback windows.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Default trailing span handed to the decision source, in calendar days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Extra history requested ahead of the first simulated date when prefetching.
pub const PREFETCH_HISTORY_DAYS: i64 = 365;

/// Longest lookback accepted by config validation.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday-to-Friday dates in `[start, end]`. Empty when `start > end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// `date` minus `days`, or `None` when that falls outside the calendar.
pub fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|span| date.checked_sub_signed(span))
}

/// Trailing date range ending at the simulated date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    pub fn ending_at(date: NaiveDate, lookback_days: i64) -> Self {
        LookbackWindow {
            start: days_before(date, lookback_days.max(0)).unwrap_or(NaiveDate::MIN),
            end: date,
        }
    }

    /// A zero-length window carries no history to trade on.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
