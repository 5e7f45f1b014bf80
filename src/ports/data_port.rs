//! Price provider port.

use chrono::NaiveDate;

use crate::domain::calendar::LookbackWindow;
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;

pub trait PriceProvider {
    /// Close of the last bar inside `window`.
    ///
    /// Fails with [`BacktestError::DataUnavailable`] when there is none.
    fn latest_close(&self, ticker: &str, window: &LookbackWindow) -> Result<f64, BacktestError>;

    /// Bars dated within `[start, end]`, ordered by date.
    fn price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError>;

    /// First date, last date and bar count available for `ticker`.
    fn data_range(&self, ticker: &str)
    -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError>;

    /// Warm any cache ahead of the date loop. Has no effect on results.
    fn prefetch(
        &self,
        _ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<(), BacktestError> {
        Ok(())
    }
}
