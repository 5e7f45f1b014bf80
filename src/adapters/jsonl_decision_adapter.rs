//! Scripted decision source backed by a JSON-lines file.
//!
//! Each line holds one date's output:
//!
//! ```text
//! {"date": "2024-01-02", "decisions": {"AAPL": {"action": "buy", "quantity": 500}},
//!  "analyst_signals": {"fundamentals": {"AAPL": {"signal": "bullish", "confidence": "75%"}}}}
//! ```
//!
//! Dates without a line produce an empty output, so every ticker holds.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::decision::{parse_decision_output, DecisionOutput};
use crate::domain::error::BacktestError;
use crate::ports::decision_port::{DecisionRequest, DecisionSource};

pub struct JsonlDecisionAdapter {
    by_date: HashMap<NaiveDate, String>,
}

impl JsonlDecisionAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BacktestError> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&content))
    }

    /// Index lines by date. Lines without a readable date are skipped; a
    /// later line for the same date replaces an earlier one.
    pub fn parse(content: &str) -> Self {
        let mut by_date = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line_date(line) {
                Some(date) => {
                    by_date.insert(date, line.to_string());
                }
                None => warn!(line = idx + 1, "decision line has no readable date, ignoring"),
            }
        }
        debug!(dates = by_date.len(), "loaded scripted decisions");
        Self { by_date }
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

fn line_date(line: &str) -> Option<NaiveDate> {
    let value: Value = serde_json::from_str(line).ok()?;
    let raw = value.get("date")?.as_str()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Upper-case ticker keys and keep only the requested analysts.
fn normalise(mut output: DecisionOutput, analysts: &[String]) -> DecisionOutput {
    output.decisions = upper_case_keys(std::mem::take(&mut output.decisions));

    if !analysts.is_empty() {
        output
            .analyst_signals
            .retain(|name, _| analysts.iter().any(|a| a.eq_ignore_ascii_case(name)));
    }
    for signals in output.analyst_signals.values_mut() {
        *signals = upper_case_keys(std::mem::take(signals));
    }
    output
}

/// When `aapl` and `AAPL` both appear, the key already in upper case wins.
fn upper_case_keys<V>(map: HashMap<String, V>) -> HashMap<String, V> {
    let mut out = HashMap::with_capacity(map.len());
    let mut exact = HashSet::new();
    for (key, value) in map {
        let upper = key.to_uppercase();
        let is_exact = upper == key;
        if out.contains_key(&upper) {
            warn!(ticker = %upper, "ticker appears more than once with different case");
            if !is_exact || exact.contains(&upper) {
                continue;
            }
        }
        if is_exact {
            exact.insert(upper.clone());
        }
        out.insert(upper, value);
    }
    out
}

impl DecisionSource for JsonlDecisionAdapter {
    fn decide(&mut self, request: &DecisionRequest<'_>) -> Result<DecisionOutput, BacktestError> {
        match self.by_date.get(&request.date) {
            Some(line) => {
                let output = parse_decision_output(line).map_err(|e| {
                    BacktestError::decision(format!("{}: {e}", request.date))
                })?;
                Ok(normalise(output, request.analysts))
            }
            None => Ok(DecisionOutput::default()),
        }
    }
}
