//! Backtest driver.
//!
//! Walks the business-day calendar, asks the decision source for one set of
//! decisions per date, fills them through the execution policy against the
//! portfolio ledger and records the portfolio value after every date.
//! Period `t + 1` always sees the portfolio left by period `t`.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::calendar::{
    business_days, days_before, LookbackWindow, DEFAULT_LOOKBACK_DAYS, PREFETCH_HISTORY_DAYS,
};
use super::config_validation::validate_backtest_config;
use super::decision::{DecisionOutput, SignalTally};
use super::error::BacktestError;
use super::execution::{self, resolve_action, signed_quantity, UnknownActionPolicy};
use super::metrics::PerformanceReport;
use super::portfolio::{Portfolio, ValuationPoint};
use crate::ports::data_port::PriceProvider;
use crate::ports::decision_port::{DecisionRequest, DecisionSource};
use crate::ports::report_port::{ReportSink, SummaryRow, TradeRow};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub lookback_days: i64,
    /// Analysts to consult; empty lets the decision source choose.
    pub analysts: Vec<String>,
    pub unknown_action: UnknownActionPolicy,
    pub prefetch: bool,
}

impl BacktestConfig {
    pub fn new(
        tickers: Vec<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
    ) -> Self {
        BacktestConfig {
            tickers,
            start_date,
            end_date,
            initial_capital,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            analysts: Vec::new(),
            unknown_action: UnknownActionPolicy::default(),
            prefetch: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub valuation_history: Vec<ValuationPoint>,
    pub report: PerformanceReport,
}

pub fn run_backtest(
    decision_source: &mut dyn DecisionSource,
    prices: &dyn PriceProvider,
    sink: &mut dyn ReportSink,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    validate_backtest_config(config)?;

    let dates = business_days(config.start_date, config.end_date);
    info!(
        tickers = config.tickers.len(),
        dates = dates.len(),
        start = %config.start_date,
        end = %config.end_date,
        "starting backtest"
    );

    if config.prefetch {
        prefetch_prices(prices, config);
    }

    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut history: Vec<ValuationPoint> = Vec::with_capacity(dates.len());
    let mut last_prices: HashMap<String, f64> = HashMap::new();

    for date in dates {
        let window = LookbackWindow::ending_at(date, config.lookback_days);
        let output = request_decisions(decision_source, &portfolio, config, date, window)?;
        let mut day_signals = SignalTally::default();

        for ticker in &config.tickers {
            if window.is_empty() {
                debug!(%date, %ticker, "lookback window is empty, not trading");
                continue;
            }

            let price = match prices.latest_close(ticker, &window) {
                Ok(price) => price,
                Err(e @ BacktestError::DataUnavailable { .. }) => {
                    warn!(%date, %ticker, error = %e, "no price, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            last_prices.insert(ticker.clone(), price);

            let decision = output.decision_for(ticker);
            let action = resolve_action(ticker, &decision, config.unknown_action)?;
            let executed = execution::execute(
                &action,
                decision.quantity,
                price,
                portfolio.cash,
                portfolio.shares(ticker),
            );
            portfolio.apply_trade(ticker, signed_quantity(&action, executed), price)?;

            if executed > 0 {
                debug!(%date, %ticker, %action, requested = decision.quantity, executed, price, "filled");
            }

            let signals = output.tally_for(ticker);
            day_signals.merge(signals);

            sink.record_trade(&TradeRow {
                date,
                ticker: ticker.clone(),
                action: decision.action,
                executed_quantity: executed,
                price,
                shares_owned: portfolio.shares(ticker),
                position_value: portfolio.position_value(ticker, price),
                signals,
            })?;
        }

        let total_value = portfolio.value_at(&last_prices);
        history.push(ValuationPoint {
            date,
            value: total_value,
        });

        sink.record_summary(&SummaryRow {
            date,
            cash: portfolio.cash,
            position_value: total_value - portfolio.cash,
            total_value,
            return_pct: (total_value - config.initial_capital) / config.initial_capital * 100.0,
            signals: day_signals,
        })?;
    }

    let report = PerformanceReport::compute(&history, &portfolio, &config.tickers, &last_prices);
    info!(
        final_value = report.final_value,
        total_return = report.total_return,
        sharpe = report.sharpe_ratio,
        max_drawdown = report.max_drawdown,
        "backtest complete"
    );
    sink.finish(&report)?;

    Ok(BacktestResult {
        portfolio,
        valuation_history: history,
        report,
    })
}

fn request_decisions(
    decision_source: &mut dyn DecisionSource,
    portfolio: &Portfolio,
    config: &BacktestConfig,
    date: NaiveDate,
    window: LookbackWindow,
) -> Result<DecisionOutput, BacktestError> {
    let request = DecisionRequest {
        date,
        tickers: &config.tickers,
        window,
        portfolio,
        analysts: &config.analysts,
    };
    match decision_source.decide(&request) {
        Ok(output) => Ok(output),
        Err(BacktestError::DecisionSource { reason }) => {
            warn!(%date, %reason, "decision source failed, holding all tickers");
            Ok(DecisionOutput::default())
        }
        Err(e) => Err(e),
    }
}

fn prefetch_prices(prices: &dyn PriceProvider, config: &BacktestConfig) {
    let Some(start) = days_before(config.start_date, PREFETCH_HISTORY_DAYS) else {
        warn!(start = %config.start_date, "prefetch range starts before the calendar, skipping");
        return;
    };
    for ticker in &config.tickers {
        if let Err(e) = prices.prefetch(ticker, start, config.end_date) {
            warn!(%ticker, error = %e, "prefetch failed");
        }
    }
}
