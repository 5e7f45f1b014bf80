//! Configuration validation.
//!
//! Runs before any simulation state exists so a bad ticker list or date
//! range never produces a partial run.

use std::collections::HashSet;

use super::backtest::BacktestConfig;
use super::calendar::MAX_LOOKBACK_DAYS;
use super::error::BacktestError;
use super::universe::UniverseError;

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), BacktestError> {
    validate_tickers(&config.tickers)?;
    validate_dates(config)?;
    validate_initial_capital(config.initial_capital)?;
    validate_lookback(config.lookback_days)?;
    Ok(())
}

fn validate_tickers(tickers: &[String]) -> Result<(), BacktestError> {
    if tickers.is_empty() {
        return Err(UniverseError::EmptyList.into());
    }
    let mut seen = HashSet::new();
    for ticker in tickers {
        if ticker.trim().is_empty() {
            return Err(UniverseError::EmptyToken.into());
        }
        if !seen.insert(ticker.as_str()) {
            return Err(UniverseError::DuplicateTicker(ticker.clone()).into());
        }
    }
    Ok(())
}

fn validate_dates(config: &BacktestConfig) -> Result<(), BacktestError> {
    if config.start_date > config.end_date {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: format!(
                "start_date {} is after end_date {}",
                config.start_date, config.end_date
            ),
        });
    }
    Ok(())
}

fn validate_initial_capital(value: f64) -> Result<(), BacktestError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_lookback(days: i64) -> Result<(), BacktestError> {
    if !(0..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(BacktestError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "lookback_days".to_string(),
            reason: format!("lookback_days must be between 0 and {MAX_LOOKBACK_DAYS}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid() -> BacktestConfig {
        BacktestConfig::new(
            vec!["AAPL".into(), "MSFT".into()],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
            100_000.0,
        )
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_backtest_config(&valid()).is_ok());
    }

    #[test]
    fn single_day_range_passes() {
        let c = BacktestConfig {
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..valid()
        };
        assert!(validate_backtest_config(&c).is_ok());
    }

    #[test]
    fn empty_tickers_rejected() {
        let c = BacktestConfig {
            tickers: vec![],
            ..valid()
        };
        let err = validate_backtest_config(&c).unwrap_err();
        assert!(matches!(err, BacktestError::Universe(UniverseError::EmptyList)));
    }

    #[test]
    fn duplicate_tickers_rejected() {
        let c = BacktestConfig {
            tickers: vec!["AAPL".into(), "AAPL".into()],
            ..valid()
        };
        let err = validate_backtest_config(&c).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Universe(UniverseError::DuplicateTicker(t)) if t == "AAPL"
        ));
    }

    #[test]
    fn inverted_dates_rejected() {
        let c = BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            ..valid()
        };
        let err = validate_backtest_config(&c).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn non_positive_capital_rejected() {
        for capital in [0.0, -1.0, f64::NAN] {
            let c = BacktestConfig {
                initial_capital: capital,
                ..valid()
            };
            let err = validate_backtest_config(&c).unwrap_err();
            assert!(
                matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "initial_capital")
            );
        }
    }

    #[test]
    fn negative_lookback_rejected() {
        let c = BacktestConfig {
            lookback_days: -1,
            ..valid()
        };
        let err = validate_backtest_config(&c).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "lookback_days"));
    }

    #[test]
    fn oversized_lookback_rejected() {
        let c = BacktestConfig {
            lookback_days: 100_000_000,
            ..valid()
        };
        let err = validate_backtest_config(&c).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "lookback_days"));

        let c = BacktestConfig {
            lookback_days: MAX_LOOKBACK_DAYS,
            ..valid()
        };
        assert!(validate_backtest_config(&c).is_ok());
    }
}
