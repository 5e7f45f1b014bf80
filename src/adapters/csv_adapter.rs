//! CSV file price adapter.
//!
//! Reads `<base_path>/<TICKER>.csv` with a `date,open,high,low,close,volume`
//! header. Each file is parsed once and kept in memory for the rest of the run.

use chrono::NaiveDate;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::calendar::LookbackWindow;
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{last_close_between, OhlcvBar};
use crate::ports::data_port::PriceProvider;

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: i64,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
    cache: RefCell<HashMap<String, Vec<OhlcvBar>>>,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    fn load(&self, ticker: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        let path = self.csv_path(ticker);
        let file = File::open(&path).map_err(|e| {
            BacktestError::data_unavailable(ticker, format!("failed to read {}: {e}", path.display()))
        })?;

        let mut rdr = csv::Reader::from_reader(file);
        let mut bars = Vec::new();
        for record in rdr.deserialize::<CsvBar>() {
            let row = record.map_err(|e| {
                BacktestError::data_unavailable(
                    ticker,
                    format!("CSV parse error in {}: {e}", path.display()),
                )
            })?;
            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(ticker, bars = bars.len(), path = %path.display(), "loaded price history");
        Ok(bars)
    }

    /// Run `f` over the cached bars for `ticker`, loading them on first use.
    fn with_bars<T>(
        &self,
        ticker: &str,
        f: impl FnOnce(&[OhlcvBar]) -> T,
    ) -> Result<T, BacktestError> {
        if let Some(bars) = self.cache.borrow().get(ticker) {
            return Ok(f(bars));
        }
        let bars = self.load(ticker)?;
        let out = f(&bars);
        self.cache.borrow_mut().insert(ticker.to_string(), bars);
        Ok(out)
    }
}

impl PriceProvider for CsvPriceAdapter {
    fn latest_close(&self, ticker: &str, window: &LookbackWindow) -> Result<f64, BacktestError> {
        self.with_bars(ticker, |bars| last_close_between(bars, window.start, window.end))?
            .ok_or_else(|| {
                BacktestError::data_unavailable(
                    ticker,
                    format!("no bars between {} and {}", window.start, window.end),
                )
            })
    }

    fn price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError> {
        self.with_bars(ticker, |bars| {
            bars.iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect()
        })
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        self.with_bars(ticker, |bars| match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }

    fn prefetch(&self, ticker: &str, _start: NaiveDate, _end: NaiveDate) -> Result<(), BacktestError> {
        self.with_bars(ticker, |_| ())
    }
}
