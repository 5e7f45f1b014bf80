//! Portfolio ledger and valuation history.
//!
//! The ledger trusts the execution policy to size trades, but still refuses
//! any trade that would leave cash or a position negative.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::error::BacktestError;

/// One entry of the append-only valuation record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    /// Whole shares held per ticker. Flat positions are removed.
    pub positions: BTreeMap<String, i64>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
        }
    }

    pub fn shares(&self, ticker: &str) -> i64 {
        self.positions.get(ticker).copied().unwrap_or(0)
    }

    pub fn position_value(&self, ticker: &str, price: f64) -> f64 {
        self.shares(ticker) as f64 * price
    }

    /// Buy (`signed_quantity > 0`) or sell (`< 0`) at `price`.
    ///
    /// Cash moves by exactly `signed_quantity * price`. The portfolio is left
    /// untouched when the trade is rejected.
    pub fn apply_trade(
        &mut self,
        ticker: &str,
        signed_quantity: i64,
        price: f64,
    ) -> Result<(), BacktestError> {
        if !price.is_finite() || price < 0.0 {
            return Err(BacktestError::InvalidTrade {
                ticker: ticker.to_string(),
                reason: format!("price {price} is not a valid trade price"),
            });
        }
        if signed_quantity == 0 {
            return Ok(());
        }

        let new_cash = self.cash - signed_quantity as f64 * price;
        if new_cash < 0.0 {
            return Err(BacktestError::InvalidTrade {
                ticker: ticker.to_string(),
                reason: format!(
                    "buying {signed_quantity} at {price:.2} needs {:.2}, only {:.2} cash available",
                    signed_quantity as f64 * price,
                    self.cash
                ),
            });
        }

        let current = self.shares(ticker);
        let new_shares = current.checked_add(signed_quantity).ok_or_else(|| {
            BacktestError::InvalidTrade {
                ticker: ticker.to_string(),
                reason: "share count overflow".to_string(),
            }
        })?;
        if new_shares < 0 {
            return Err(BacktestError::InvalidTrade {
                ticker: ticker.to_string(),
                reason: format!(
                    "selling {} shares with only {current} held",
                    signed_quantity.unsigned_abs()
                ),
            });
        }

        self.cash = new_cash;
        if new_shares == 0 {
            self.positions.remove(ticker);
        } else {
            self.positions.insert(ticker.to_string(), new_shares);
        }
        Ok(())
    }

    /// Cash plus every held position marked at `prices`. Positions without a
    /// price contribute nothing.
    pub fn value_at(&self, prices: &HashMap<String, f64>) -> f64 {
        let holdings: f64 = self
            .positions
            .iter()
            .filter_map(|(ticker, &shares)| prices.get(ticker).map(|&p| shares as f64 * p))
            .sum();
        self.cash + holdings
    }
}
