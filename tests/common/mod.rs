#![allow(dead_code)]

use backtester::domain::backtest::BacktestConfig;
use backtester::domain::calendar::LookbackWindow;
use backtester::domain::decision::{
    AnalystSignal, DecisionOutput, Signal, TradeAction, TradeDecision,
};
use backtester::domain::error::BacktestError;
use backtester::domain::metrics::PerformanceReport;
pub use backtester::domain::ohlcv::OhlcvBar;
use backtester::domain::ohlcv::last_close_between;
use backtester::ports::data_port::PriceProvider;
use backtester::ports::decision_port::{DecisionRequest, DecisionSource};
use backtester::ports::report_port::{ReportSink, SummaryRow, TradeRow};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(ticker: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

pub fn sample_config(tickers: &[&str], start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig::new(
        tickers.iter().map(|t| t.to_string()).collect(),
        start,
        end,
        100_000.0,
    )
}

/// In-memory prices. `fail` makes a ticker return a non-data error.
pub struct MockPriceProvider {
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub fail: HashMap<String, String>,
    pub prefetched: RefCell<Vec<String>>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            fail: HashMap::new(),
            prefetched: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, mut bars: Vec<OhlcvBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    /// Closes for consecutive entries of `dates`.
    pub fn with_closes(self, ticker: &str, dates: &[NaiveDate], closes: &[f64]) -> Self {
        let bars = dates
            .iter()
            .zip(closes)
            .map(|(d, c)| make_bar(ticker, &d.to_string(), *c))
            .collect();
        self.with_bars(ticker, bars)
    }

    pub fn with_failure(mut self, ticker: &str, reason: &str) -> Self {
        self.fail.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceProvider for MockPriceProvider {
    fn latest_close(&self, ticker: &str, window: &LookbackWindow) -> Result<f64, BacktestError> {
        if let Some(reason) = self.fail.get(ticker) {
            return Err(BacktestError::Io(std::io::Error::other(reason.clone())));
        }
        let bars = self.bars.get(ticker).map(Vec::as_slice).unwrap_or(&[]);
        last_close_between(bars, window.start, window.end)
            .ok_or_else(|| BacktestError::data_unavailable(ticker, "no bars in window"))
    }

    fn price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, BacktestError> {
        Ok(self
            .bars
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        Ok(self.bars.get(ticker).and_then(|bars| {
            Some((bars.first()?.date, bars.last()?.date, bars.len()))
        }))
    }

    fn prefetch(&self, ticker: &str, _start: NaiveDate, _end: NaiveDate) -> Result<(), BacktestError> {
        self.prefetched.borrow_mut().push(ticker.to_string());
        Ok(())
    }
}

/// What a decision source saw when it was asked.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub date: NaiveDate,
    pub cash: f64,
    pub positions: Vec<(String, i64)>,
    pub window: LookbackWindow,
    pub analysts: Vec<String>,
}

/// Returns canned output per date; dates without a script hold.
pub struct ScriptedDecisionSource {
    pub script: HashMap<NaiveDate, Result<DecisionOutput, String>>,
    pub seen: Vec<SeenRequest>,
}

impl ScriptedDecisionSource {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            seen: Vec::new(),
        }
    }

    pub fn on(mut self, date: NaiveDate, decisions: &[(&str, TradeAction, i64)]) -> Self {
        let output = DecisionOutput {
            decisions: decisions
                .iter()
                .map(|(t, a, q)| (t.to_string(), TradeDecision::new(a.clone(), *q)))
                .collect(),
            ..DecisionOutput::default()
        };
        self.script.insert(date, Ok(output));
        self
    }

    pub fn with_output(mut self, date: NaiveDate, output: DecisionOutput) -> Self {
        self.script.insert(date, Ok(output));
        self
    }

    pub fn failing_on(mut self, date: NaiveDate, reason: &str) -> Self {
        self.script.insert(date, Err(reason.to_string()));
        self
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<DecisionOutput, BacktestError> {
        self.seen.push(SeenRequest {
            date: request.date,
            cash: request.portfolio.cash,
            positions: request
                .portfolio
                .positions
                .iter()
                .map(|(t, q)| (t.clone(), *q))
                .collect(),
            window: request.window,
            analysts: request.analysts.to_vec(),
        });
        match self.script.get(&request.date) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(reason)) => Err(BacktestError::decision(reason.clone())),
            None => Ok(DecisionOutput::default()),
        }
    }
}

pub fn signal(analyst: &str, ticker: &str, signal: Signal) -> (String, HashMap<String, AnalystSignal>) {
    (
        analyst.to_string(),
        HashMap::from([(
            ticker.to_string(),
            AnalystSignal {
                signal,
                confidence: None,
            },
        )]),
    )
}

#[derive(Default)]
pub struct RecordingSink {
    pub trades: Vec<TradeRow>,
    pub summaries: Vec<SummaryRow>,
    pub report: Option<PerformanceReport>,
}

impl ReportSink for RecordingSink {
    fn record_trade(&mut self, row: &TradeRow) -> Result<(), BacktestError> {
        self.trades.push(row.clone());
        Ok(())
    }

    fn record_summary(&mut self, row: &SummaryRow) -> Result<(), BacktestError> {
        self.summaries.push(row.clone());
        Ok(())
    }

    fn finish(&mut self, report: &PerformanceReport) -> Result<(), BacktestError> {
        self.report = Some(report.clone());
        Ok(())
    }
}
