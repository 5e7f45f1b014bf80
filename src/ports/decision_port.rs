//! Decision source port.

use chrono::NaiveDate;

use crate::domain::calendar::LookbackWindow;
use crate::domain::decision::DecisionOutput;
use crate::domain::error::BacktestError;
use crate::domain::portfolio::Portfolio;

/// Inputs handed to the decision source once per simulated date.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'a> {
    pub date: NaiveDate,
    pub tickers: &'a [String],
    pub window: LookbackWindow,
    pub portfolio: &'a Portfolio,
    /// Analysts to consult. Empty means the source's default set.
    pub analysts: &'a [String],
}

/// Produces per-ticker trade decisions for a date.
///
/// Returning [`BacktestError::DecisionSource`] degrades the date to holds;
/// any other error aborts the run.
pub trait DecisionSource {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<DecisionOutput, BacktestError>;
}
