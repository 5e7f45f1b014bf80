//! Daily price bar as supplied by the price provider.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Close of the last bar dated within `[start, end]`, assuming `bars` is sorted by date.
pub fn last_close_between(bars: &[OhlcvBar], start: NaiveDate, end: NaiveDate) -> Option<f64> {
    bars.iter()
        .rev()
        .find(|b| b.date >= start && b.date <= end)
        .map(|b| b.close)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn picks_latest_bar_in_range() {
        let bars = vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0), bar(6, 13.0)];
        assert_eq!(last_close_between(&bars, d(1), d(5)), Some(12.0));
    }

    #[test]
    fn none_when_range_has_no_bars() {
        let bars = vec![bar(1, 10.0), bar(8, 11.0)];
        assert_eq!(last_close_between(&bars, d(2), d(7)), None);
    }

    #[test]
    fn inclusive_bounds() {
        let bars = vec![bar(2, 10.0)];
        assert_eq!(last_close_between(&bars, d(2), d(2)), Some(10.0));
    }
}
