//! Trade execution policy.
//!
//! Maps a requested trade to the quantity that can actually be filled given
//! the cash and shares on hand. Buys that cannot be afforded in full are
//! partially filled with as many whole shares as the cash covers; sells are
//! clamped to the shares held.

use std::str::FromStr;

use super::decision::{TradeAction, TradeDecision};
use super::error::BacktestError;

/// What to do when a decision carries an action other than buy/sell/hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownActionPolicy {
    /// Log and execute nothing.
    #[default]
    Hold,
    /// Abort the run with a decision-source error.
    Fail,
}

impl FromStr for UnknownActionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hold" => Ok(UnknownActionPolicy::Hold),
            "fail" => Ok(UnknownActionPolicy::Fail),
            other => Err(format!("expected hold or fail, got {other:?}")),
        }
    }
}

/// Executed quantity for `action`, always in `0..=requested_quantity`.
pub fn execute(
    action: &TradeAction,
    requested_quantity: i64,
    current_price: f64,
    available_cash: f64,
    available_shares: i64,
) -> i64 {
    if requested_quantity <= 0 || !current_price.is_finite() || current_price <= 0.0 {
        return 0;
    }

    match action {
        TradeAction::Buy => {
            if requested_quantity as f64 * current_price <= available_cash {
                return requested_quantity;
            }
            max_affordable(available_cash, current_price).min(requested_quantity)
        }
        TradeAction::Sell => requested_quantity.min(available_shares).max(0),
        TradeAction::Hold | TradeAction::Unknown(_) => 0,
    }
}

/// `floor(cash / price)`, backed off when the division rounds up past what
/// the cash actually covers.
fn max_affordable(cash: f64, price: f64) -> i64 {
    if cash <= 0.0 {
        return 0;
    }
    let mut quantity = (cash / price).floor() as i64;
    while quantity > 0 && quantity as f64 * price > cash {
        quantity -= 1;
    }
    quantity
}

/// Resolve a decision's action under `policy` before execution.
pub fn resolve_action(
    ticker: &str,
    decision: &TradeDecision,
    policy: UnknownActionPolicy,
) -> Result<TradeAction, BacktestError> {
    match (&decision.action, policy) {
        (TradeAction::Unknown(raw), UnknownActionPolicy::Hold) => {
            tracing::warn!(ticker, action = %raw, "unrecognised action, holding");
            Ok(TradeAction::Hold)
        }
        (TradeAction::Unknown(raw), UnknownActionPolicy::Fail) => Err(BacktestError::decision(
            format!("unrecognised action {raw:?} for {ticker}"),
        )),
        (action, _) => Ok(action.clone()),
    }
}

/// Signed ledger quantity for an executed trade.
pub fn signed_quantity(action: &TradeAction, executed: i64) -> i64 {
    match action {
        TradeAction::Sell => -executed,
        TradeAction::Buy => executed,
        TradeAction::Hold | TradeAction::Unknown(_) => 0,
    }
}
