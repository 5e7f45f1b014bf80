//! Plain-text report sink.
//!
//! Prints one line per trade row, one line per date summary and a final
//! performance block. Output is plain text with no terminal styling.

use std::io::Write;

use crate::domain::error::BacktestError;
use crate::domain::metrics::PerformanceReport;
use crate::ports::report_port::{ReportSink, SummaryRow, TradeRow};

pub struct ConsoleReportAdapter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> ConsoleReportAdapter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> Result<(), BacktestError> {
        if !self.header_written {
            writeln!(
                self.out,
                "{:<10}  {:<6}  {:<6}  {:>8}  {:>10}  {:>8}  {:>14}  {:>7}  {:>7}  {:>7}",
                "Date",
                "Ticker",
                "Action",
                "Quantity",
                "Price",
                "Shares",
                "Position",
                "Bullish",
                "Bearish",
                "Neutral",
            )?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> ReportSink for ConsoleReportAdapter<W> {
    fn record_trade(&mut self, row: &TradeRow) -> Result<(), BacktestError> {
        self.write_header()?;
        writeln!(
            self.out,
            "{:<10}  {:<6}  {:<6}  {:>8}  {:>10.2}  {:>8}  {:>14.2}  {:>7}  {:>7}  {:>7}",
            row.date,
            row.ticker,
            row.action.to_string(),
            row.executed_quantity,
            row.price,
            row.shares_owned,
            row.position_value,
            row.signals.bullish,
            row.signals.bearish,
            row.signals.neutral,
        )?;
        Ok(())
    }

    fn record_summary(&mut self, row: &SummaryRow) -> Result<(), BacktestError> {
        self.write_header()?;
        writeln!(
            self.out,
            "{:<10}  PORTFOLIO  cash {:.2}  positions {:.2}  total {:.2}  return {:+.2}%",
            row.date, row.cash, row.position_value, row.total_value, row.return_pct,
        )?;
        Ok(())
    }

    fn finish(&mut self, report: &PerformanceReport) -> Result<(), BacktestError> {
        writeln!(self.out)?;
        writeln!(self.out, "=== Performance ===")?;
        writeln!(self.out, "Initial Capital:  {:.2}", report.initial_capital)?;
        writeln!(self.out, "Final Value:      {:.2}", report.final_value)?;
        writeln!(self.out, "Total Return:     {:.2}%", report.total_return * 100.0)?;
        writeln!(self.out, "Sharpe Ratio:     {:.2}", report.sharpe_ratio)?;
        writeln!(self.out, "Max Drawdown:     {:.2}%", report.max_drawdown * 100.0)?;

        if !report.ticker_returns.is_empty() {
            writeln!(self.out)?;
            writeln!(
                self.out,
                "=== Per-Ticker Return (approximate: cash split evenly across tickers) ==="
            )?;
            for (ticker, ret) in &report.ticker_returns {
                writeln!(self.out, "  {:<8} {:+.2}%", ticker, ret * 100.0)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::{SignalTally, TradeAction};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn render(f: impl FnOnce(&mut ConsoleReportAdapter<Vec<u8>>)) -> String {
        let mut adapter = ConsoleReportAdapter::new(Vec::new());
        f(&mut adapter);
        String::from_utf8(adapter.into_inner()).unwrap()
    }

    #[test]
    fn trade_row_rendered_after_single_header() {
        let row = TradeRow {
            date: date(),
            ticker: "AAPL".into(),
            action: TradeAction::Buy,
            executed_quantity: 500,
            price: 100.0,
            shares_owned: 500,
            position_value: 50_000.0,
            signals: SignalTally {
                bullish: 2,
                bearish: 1,
                neutral: 0,
            },
        };
        let out = render(|a| {
            a.record_trade(&row).unwrap();
            a.record_trade(&row).unwrap();
        });

        assert_eq!(out.matches("Ticker").count(), 1);
        let header = out.lines().next().unwrap();
        assert!(header.starts_with("Date        Ticker  Action  Quantity"));
        assert!(header.ends_with("Bullish  Bearish  Neutral"));
        assert_eq!(out.lines().count(), 3);
        let line = out.lines().nth(1).unwrap();
        assert!(line.starts_with("2024-01-02"));
        assert!(line.contains("AAPL"));
        assert!(line.contains("buy"));
        assert!(line.contains("100.00"));
        assert!(line.contains("50000.00"));
    }

    #[test]
    fn summary_row_shows_total_and_return() {
        let row = SummaryRow {
            date: date(),
            cash: 50_000.0,
            position_value: 55_000.0,
            total_value: 105_000.0,
            return_pct: 5.0,
            signals: SignalTally::default(),
        };
        let out = render(|a| a.record_summary(&row).unwrap());
        assert!(out.contains("total 105000.00"));
        assert!(out.contains("return +5.00%"));
    }

    #[test]
    fn final_report_labels_ticker_returns_approximate() {
        let report = PerformanceReport {
            initial_capital: 100_000.0,
            final_value: 95_000.0,
            total_return: -0.05,
            ticker_returns: BTreeMap::from([("AAPL".to_string(), -0.05)]),
            daily_returns: vec![],
            sharpe_ratio: -1.234,
            drawdowns: vec![],
            max_drawdown: -0.136,
        };
        let out = render(|a| a.finish(&report).unwrap());
        assert!(out.contains("Total Return:     -5.00%"));
        assert!(out.contains("Sharpe Ratio:     -1.23"));
        assert!(out.contains("Max Drawdown:     -13.60%"));
        assert!(out.contains("approximate"));
        assert!(out.contains("AAPL     -5.00%"));
    }
}
