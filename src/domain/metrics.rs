//! Performance statistics computed once over the finished valuation history.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::portfolio::{Portfolio, ValuationPoint};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    /// Approximate attribution: cash is split evenly across the universe.
    pub ticker_returns: BTreeMap<String, f64>,
    /// Aligned with the valuation history; the first entry is always `None`.
    pub daily_returns: Vec<Option<f64>>,
    pub sharpe_ratio: f64,
    /// `value / running_max - 1` per point; never positive.
    pub drawdowns: Vec<f64>,
    pub max_drawdown: f64,
}

impl PerformanceReport {
    pub fn compute(
        history: &[ValuationPoint],
        portfolio: &Portfolio,
        tickers: &[String],
        last_prices: &HashMap<String, f64>,
    ) -> Self {
        let initial_capital = portfolio.initial_capital;
        let final_value = history
            .last()
            .map(|p| p.value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let daily_returns = daily_returns(history);
        let drawdowns = drawdown_series(history);
        let max_drawdown = drawdowns.iter().copied().fold(0.0_f64, f64::min);

        PerformanceReport {
            initial_capital,
            final_value,
            total_return,
            ticker_returns: ticker_returns(portfolio, tickers, last_prices),
            sharpe_ratio: sharpe_ratio(&daily_returns),
            daily_returns,
            drawdowns,
            max_drawdown,
        }
    }
}

/// `((position_value + cash / n) / (initial_capital / n)) - 1` per ticker.
fn ticker_returns(
    portfolio: &Portfolio,
    tickers: &[String],
    last_prices: &HashMap<String, f64>,
) -> BTreeMap<String, f64> {
    if tickers.is_empty() || portfolio.initial_capital <= 0.0 {
        return BTreeMap::new();
    }
    let n = tickers.len() as f64;
    let cash_share = portfolio.cash / n;
    let capital_share = portfolio.initial_capital / n;

    tickers
        .iter()
        .map(|ticker| {
            let price = last_prices.get(ticker).copied().unwrap_or(0.0);
            let position_value = portfolio.position_value(ticker, price);
            (
                ticker.clone(),
                (position_value + cash_share) / capital_share - 1.0,
            )
        })
        .collect()
}

fn daily_returns(history: &[ValuationPoint]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(history.len());
    if history.is_empty() {
        return returns;
    }
    returns.push(None);
    returns.extend(history.windows(2).map(|w| {
        let prev = w[0].value;
        if prev != 0.0 {
            Some((w[1].value - prev) / prev)
        } else {
            None
        }
    }));
    returns
}

/// Annualised mean/stddev of the defined daily returns, using the sample
/// standard deviation. Zero when the ratio is undefined.
fn sharpe_ratio(daily_returns: &[Option<f64>]) -> f64 {
    let returns: Vec<f64> = daily_returns.iter().flatten().copied().collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn drawdown_series(history: &[ValuationPoint]) -> Vec<f64> {
    let mut running_max = f64::NEG_INFINITY;
    history
        .iter()
        .map(|point| {
            running_max = running_max.max(point.value);
            if running_max > 0.0 {
                point.value / running_max - 1.0
            } else {
                0.0
            }
        })
        .collect()
}
