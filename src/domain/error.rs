//! Domain error types.

use super::universe::UniverseError;

/// Top-level error type for the backtester.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid trade on {ticker}: {reason}")]
    InvalidTrade { ticker: String, reason: String },

    #[error("decision source error: {reason}")]
    DecisionSource { reason: String },

    #[error("no data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub fn decision(reason: impl Into<String>) -> Self {
        BacktestError::DecisionSource {
            reason: reason.into(),
        }
    }

    pub fn data_unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        BacktestError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Csv(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. }
            | BacktestError::Universe(_) => 2,
            BacktestError::DataUnavailable { .. } => 3,
            BacktestError::DecisionSource { .. } => 4,
            BacktestError::InvalidTrade { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
