//! File report sink: trade and valuation CSVs plus a JSON performance summary.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::error::BacktestError;
use crate::domain::metrics::PerformanceReport;
use crate::ports::report_port::{ReportSink, SummaryRow, TradeRow};

pub const TRADES_FILE: &str = "trades.csv";
pub const VALUATION_FILE: &str = "valuation.csv";
pub const PERFORMANCE_FILE: &str = "performance.json";

#[derive(Serialize)]
struct TradeRecord<'a> {
    date: NaiveDate,
    ticker: &'a str,
    action: String,
    quantity: i64,
    price: f64,
    shares: i64,
    position_value: f64,
    bullish: usize,
    bearish: usize,
    neutral: usize,
}

#[derive(Serialize)]
struct ValuationRecord {
    date: NaiveDate,
    cash: f64,
    position_value: f64,
    total_value: f64,
    return_pct: f64,
}

pub struct CsvReportAdapter {
    dir: PathBuf,
    trades: csv::Writer<File>,
    valuation: csv::Writer<File>,
}

impl CsvReportAdapter {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, BacktestError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            trades: csv::Writer::from_path(dir.join(TRADES_FILE))?,
            valuation: csv::Writer::from_path(dir.join(VALUATION_FILE))?,
            dir,
        })
    }
}

impl ReportSink for CsvReportAdapter {
    fn record_trade(&mut self, row: &TradeRow) -> Result<(), BacktestError> {
        self.trades.serialize(TradeRecord {
            date: row.date,
            ticker: &row.ticker,
            action: row.action.to_string(),
            quantity: row.executed_quantity,
            price: row.price,
            shares: row.shares_owned,
            position_value: row.position_value,
            bullish: row.signals.bullish,
            bearish: row.signals.bearish,
            neutral: row.signals.neutral,
        })?;
        Ok(())
    }

    fn record_summary(&mut self, row: &SummaryRow) -> Result<(), BacktestError> {
        self.valuation.serialize(ValuationRecord {
            date: row.date,
            cash: row.cash,
            position_value: row.position_value,
            total_value: row.total_value,
            return_pct: row.return_pct,
        })?;
        Ok(())
    }

    fn finish(&mut self, report: &PerformanceReport) -> Result<(), BacktestError> {
        self.trades.flush()?;
        self.valuation.flush()?;

        let path = self.dir.join(PERFORMANCE_FILE);
        let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
        fs::write(&path, json)?;
        info!(dir = %self.dir.display(), "report files written");
        Ok(())
    }
}
