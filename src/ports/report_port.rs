//! Presentation sink port.

use chrono::NaiveDate;

use crate::domain::decision::{SignalTally, TradeAction};
use crate::domain::error::BacktestError;
use crate::domain::metrics::PerformanceReport;

/// One ticker's outcome for one simulated date.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub action: TradeAction,
    pub executed_quantity: i64,
    pub price: f64,
    pub shares_owned: i64,
    pub position_value: f64,
    pub signals: SignalTally,
}

/// Portfolio totals after all tickers for a date were processed.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    pub total_value: f64,
    /// Cumulative return since the start, in percent.
    pub return_pct: f64,
    pub signals: SignalTally,
}

/// Receives rows while the backtest runs and the report once it ends.
pub trait ReportSink {
    fn record_trade(&mut self, row: &TradeRow) -> Result<(), BacktestError>;

    fn record_summary(&mut self, row: &SummaryRow) -> Result<(), BacktestError>;

    fn finish(&mut self, report: &PerformanceReport) -> Result<(), BacktestError>;
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn record_trade(&mut self, _row: &TradeRow) -> Result<(), BacktestError> {
        Ok(())
    }

    fn record_summary(&mut self, _row: &SummaryRow) -> Result<(), BacktestError> {
        Ok(())
    }

    fn finish(&mut self, _report: &PerformanceReport) -> Result<(), BacktestError> {
        Ok(())
    }
}

/// Forwards every call to each wrapped sink in order.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for FanOutSink {
    fn record_trade(&mut self, row: &TradeRow) -> Result<(), BacktestError> {
        self.sinks.iter_mut().try_for_each(|s| s.record_trade(row))
    }

    fn record_summary(&mut self, row: &SummaryRow) -> Result<(), BacktestError> {
        self.sinks.iter_mut().try_for_each(|s| s.record_summary(row))
    }

    fn finish(&mut self, report: &PerformanceReport) -> Result<(), BacktestError> {
        self.sinks.iter_mut().try_for_each(|s| s.finish(report))
    }
}
