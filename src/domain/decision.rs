//! Trade decisions and analyst signals produced by a decision source.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
    /// Anything the decision source emitted that is not buy/sell/hold.
    Unknown(String),
}

impl From<String> for TradeAction {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "buy" => TradeAction::Buy,
            "sell" => TradeAction::Sell,
            "hold" => TradeAction::Hold,
            _ => TradeAction::Unknown(raw),
        }
    }
}

impl From<TradeAction> for String {
    fn from(action: TradeAction) -> Self {
        action.to_string()
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
            TradeAction::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// One requested trade for one ticker and one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: TradeAction,
    #[serde(deserialize_with = "whole_shares")]
    pub quantity: i64,
}

impl TradeDecision {
    pub fn new(action: TradeAction, quantity: i64) -> Self {
        TradeDecision { action, quantity }
    }

    pub fn hold() -> Self {
        TradeDecision::new(TradeAction::Hold, 0)
    }
}

/// Accepts `500` and `500.0`; fractional shares are truncated.
fn whole_shares<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("quantity must be finite"));
    }
    Ok(value.trunc() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
    Other,
}

impl From<String> for Signal {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "bullish" => Signal::Bullish,
            "bearish" => Signal::Bearish,
            "neutral" => Signal::Neutral,
            _ => Signal::Other,
        }
    }
}

impl From<Signal> for &'static str {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Bullish => "bullish",
            Signal::Bearish => "bearish",
            Signal::Neutral => "neutral",
            Signal::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystSignal {
    pub signal: Signal,
    /// Fraction in `[0, 1]`. Analysts may report `0.75`, `75` or `"75%"`.
    #[serde(default, deserialize_with = "confidence")]
    pub confidence: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfidence {
    Number(f64),
    Text(String),
}

fn confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<RawConfidence>::deserialize(deserializer)?;
    let value = match raw {
        None => return Ok(None),
        Some(RawConfidence::Number(n)) => n,
        Some(RawConfidence::Text(s)) => {
            let trimmed = s.trim();
            let (digits, pct) = match trimmed.strip_suffix('%') {
                Some(d) => (d.trim(), true),
                None => (trimmed, false),
            };
            let n: f64 = digits
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid confidence {s:?}")))?;
            if pct { n / 100.0 } else { n }
        }
    };
    Ok(Some(if value > 1.0 { value / 100.0 } else { value }))
}

/// Everything a decision source returns for one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutput {
    /// A malformed entry holds that ticker without affecting the others.
    #[serde(default, deserialize_with = "per_ticker_decisions")]
    pub decisions: HashMap<String, TradeDecision>,
    /// analyst name -> ticker -> signal
    #[serde(default)]
    pub analyst_signals: BTreeMap<String, HashMap<String, AnalystSignal>>,
}

impl DecisionOutput {
    /// The decision for `ticker`, or hold when the source said nothing about it.
    pub fn decision_for(&self, ticker: &str) -> TradeDecision {
        self.decisions
            .get(ticker)
            .cloned()
            .unwrap_or_else(TradeDecision::hold)
    }

    pub fn tally_for(&self, ticker: &str) -> SignalTally {
        let mut tally = SignalTally::default();
        for signal in self
            .analyst_signals
            .values()
            .filter_map(|by_ticker| by_ticker.get(ticker))
        {
            tally.add(signal.signal);
        }
        tally
    }
}

fn per_ticker_decisions<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, TradeDecision>, D::Error> {
    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(ticker, value)| {
            let decision = TradeDecision::deserialize(value).unwrap_or_else(|e| {
                tracing::warn!(%ticker, error = %e, "malformed decision, holding");
                TradeDecision::hold()
            });
            (ticker, decision)
        })
        .collect())
}

/// Bullish/bearish/neutral counts for one ticker on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalTally {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl SignalTally {
    pub fn add(&mut self, signal: Signal) {
        match signal {
            Signal::Bullish => self.bullish += 1,
            Signal::Bearish => self.bearish += 1,
            Signal::Neutral => self.neutral += 1,
            Signal::Other => {}
        }
    }

    pub fn merge(&mut self, other: SignalTally) {
        self.bullish += other.bullish;
        self.bearish += other.bearish;
        self.neutral += other.neutral;
    }
}

/// Parse raw decision-source output (JSON) into a [`DecisionOutput`].
pub fn parse_decision_output(raw: &str) -> Result<DecisionOutput, BacktestError> {
    serde_json::from_str(raw).map_err(|e| BacktestError::decision(format!("malformed output: {e}")))
}
