//! CLI definition and dispatch.

use chrono::{Local, Months, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{info, warn};

use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::jsonl_decision_adapter::JsonlDecisionAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::calendar::{DEFAULT_LOOKBACK_DAYS, business_days};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::BacktestError;
use crate::domain::execution::UnknownActionPolicy;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceProvider;
use crate::ports::report_port::FanOutSink;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_DATA_DIR: &str = "data";
/// Lookback used for the start date when none is configured.
pub const DEFAULT_PERIOD_MONTHS: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "backtester", about = "Replay scripted trading decisions over historical prices")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest(BacktestArgs),
    /// Show the price data range for ticker(s)
    Info {
        #[arg(long)]
        tickers: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Flags for `backtest`. Every flag overrides the matching config file key.
#[derive(Args, Debug, Default, Clone)]
pub struct BacktestArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Comma-separated ticker list
    #[arg(long)]
    pub tickers: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub initial_capital: Option<f64>,
    #[arg(long)]
    pub lookback_days: Option<i64>,
    /// Comma-separated analyst names
    #[arg(long)]
    pub analysts: Option<String>,
    /// `hold` or `fail`
    #[arg(long)]
    pub unknown_action: Option<String>,
    #[arg(long)]
    pub no_prefetch: bool,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// JSON-lines file of per-date decisions
    #[arg(long)]
    pub decisions: Option<PathBuf>,
    /// Directory for trades.csv, valuation.csv and performance.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest(args) => run_backtest(&args),
        Command::Info {
            tickers,
            data_dir,
            config,
        } => run_info(tickers.as_deref(), data_dir, config.as_deref()),
    }
}

fn report(e: &BacktestError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: Option<&Path>) -> Result<Option<FileConfigAdapter>, BacktestError> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p).map(Some)
        }
        None => Ok(None),
    }
}

fn run_backtest(args: &BacktestArgs) -> ExitCode {
    let file_config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    let config_port = file_config.as_ref().map(|c| c as &dyn ConfigPort);
    let today = Local::now().date_naive();

    let bt_config = match build_backtest_config(config_port, args, today) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    if let Err(e) = validate_backtest_config(&bt_config) {
        return report(&e);
    }

    if args.dry_run {
        return run_dry_run(&bt_config);
    }

    let data_dir = resolve_data_dir(config_port, args.data_dir.as_ref());
    let decisions_path = match resolve_decisions_path(config_port, args.decisions.as_ref()) {
        Ok(p) => p,
        Err(e) => return report(&e),
    };

    let mut decisions = match JsonlDecisionAdapter::from_file(&decisions_path) {
        Ok(d) => d,
        Err(e) => return report(&e),
    };
    if decisions.is_empty() {
        warn!(path = %decisions_path.display(), "decision file has no dated entries, every ticker will hold");
    }
    let prices = CsvPriceAdapter::new(data_dir);

    let mut sink = FanOutSink::new();
    sink.push(Box::new(ConsoleReportAdapter::new(io::stdout())));
    if let Some(dir) = &args.output {
        match CsvReportAdapter::create(dir) {
            Ok(adapter) => sink.push(Box::new(adapter)),
            Err(e) => return report(&e),
        }
    }

    match backtest_engine::run_backtest(&mut decisions, &prices, &mut sink, &bt_config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn run_dry_run(config: &BacktestConfig) -> ExitCode {
    let dates = business_days(config.start_date, config.end_date);
    println!("Configuration valid.");
    println!("  Tickers:          {}", config.tickers.join(", "));
    println!("  Period:           {} to {}", config.start_date, config.end_date);
    println!("  Business days:    {}", dates.len());
    println!("  Initial capital:  {:.2}", config.initial_capital);
    println!("  Lookback days:    {}", config.lookback_days);
    if !config.analysts.is_empty() {
        println!("  Analysts:         {}", config.analysts.join(", "));
    }
    ExitCode::SUCCESS
}

/// Merge config file values and CLI flags into a [`BacktestConfig`].
///
/// Flags win over the file. Without an end date the run ends `today`;
/// without a start date it begins three months before the end date.
pub fn build_backtest_config(
    config: Option<&dyn ConfigPort>,
    args: &BacktestArgs,
    today: NaiveDate,
) -> Result<BacktestConfig, BacktestError> {
    let file_string = |key: &str| config.and_then(|c| c.get_string("backtest", key));

    let tickers_raw = args
        .tickers
        .clone()
        .or_else(|| file_string("tickers"))
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "tickers".into(),
        })?;
    let tickers = parse_tickers(&tickers_raw)?;

    let end_date = match args.end_date.clone().or_else(|| file_string("end_date")) {
        Some(s) => parse_date("end_date", &s)?,
        None => today,
    };
    let start_date = match args.start_date.clone().or_else(|| file_string("start_date")) {
        Some(s) => parse_date("start_date", &s)?,
        None => end_date
            .checked_sub_months(Months::new(DEFAULT_PERIOD_MONTHS))
            .unwrap_or(end_date),
    };

    let initial_capital = match args.initial_capital {
        Some(v) => v,
        None => file_number(config, "initial_capital")?.unwrap_or(DEFAULT_INITIAL_CAPITAL),
    };
    let lookback_days = match args.lookback_days {
        Some(v) => v,
        None => file_number(config, "lookback_days")?.unwrap_or(DEFAULT_LOOKBACK_DAYS),
    };

    let unknown_action = match args
        .unknown_action
        .clone()
        .or_else(|| file_string("unknown_action"))
    {
        Some(s) => s
            .parse::<UnknownActionPolicy>()
            .map_err(|reason| BacktestError::ConfigInvalid {
                section: "backtest".into(),
                key: "unknown_action".into(),
                reason,
            })?,
        None => UnknownActionPolicy::default(),
    };

    let analysts = match &args.analysts {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.map_or_else(Vec::new, |c| c.get_list("analysts", "selected")),
    };

    let prefetch =
        !args.no_prefetch && config.is_none_or(|c| c.get_bool("backtest", "prefetch", true));

    Ok(BacktestConfig {
        tickers,
        start_date,
        end_date,
        initial_capital,
        lookback_days,
        analysts,
        unknown_action,
        prefetch,
    })
}

/// A `[backtest]` number. Present but unparseable is an error, not a default.
fn file_number<T>(config: Option<&dyn ConfigPort>, key: &str) -> Result<Option<T>, BacktestError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = config.and_then(|c| c.get_string("backtest", key)) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: key.into(),
            reason: format!("'{raw}' is not a valid number: {e}"),
        })
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, BacktestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: key.into(),
            reason: format!("invalid date '{value}' (expected YYYY-MM-DD)"),
        }
    })
}

pub fn resolve_data_dir(config: Option<&dyn ConfigPort>, flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .or_else(|| config.and_then(|c| c.get_string("data", "dir")).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn resolve_decisions_path(
    config: Option<&dyn ConfigPort>,
    flag: Option<&PathBuf>,
) -> Result<PathBuf, BacktestError> {
    flag.cloned()
        .or_else(|| config.and_then(|c| c.get_string("decisions", "path")).map(PathBuf::from))
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "decisions".into(),
            key: "path".into(),
        })
}

fn run_info(tickers: Option<&str>, data_dir: Option<PathBuf>, config_path: Option<&Path>) -> ExitCode {
    let file_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    let config_port = file_config.as_ref().map(|c| c as &dyn ConfigPort);

    let raw = tickers
        .map(str::to_string)
        .or_else(|| config_port.and_then(|c| c.get_string("backtest", "tickers")));
    let tickers = match raw {
        Some(raw) => match parse_tickers(&raw) {
            Ok(t) => t,
            Err(e) => return report(&BacktestError::from(e)),
        },
        None => {
            return report(&BacktestError::ConfigMissing {
                section: "backtest".into(),
                key: "tickers".into(),
            });
        }
    };

    let prices = CsvPriceAdapter::new(resolve_data_dir(config_port, data_dir.as_ref()));
    for ticker in &tickers {
        match prices.data_range(ticker) {
            Ok(Some((first, last, count))) => {
                println!("{ticker}: {count} bars, {first} to {last}");
            }
            Ok(None) => eprintln!("{ticker}: no data found"),
            Err(e) => eprintln!("error reading {ticker}: {e}"),
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "backtester",
            "backtest",
            "--tickers",
            "aapl,msft",
            "--start-date",
            "2024-01-01",
            "--initial-capital",
            "5000",
            "--decisions",
            "d.jsonl",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "info");
        match cli.command {
            Command::Backtest(args) => {
                assert_eq!(args.tickers.as_deref(), Some("aapl,msft"));
                assert_eq!(args.start_date.as_deref(), Some("2024-01-01"));
                assert_eq!(args.initial_capital, Some(5000.0));
                assert_eq!(args.decisions, Some(PathBuf::from("d.jsonl")));
                assert!(args.dry_run);
                assert!(!args.no_prefetch);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_info_with_global_log_level() {
        let cli = Cli::try_parse_from([
            "backtester",
            "info",
            "--tickers",
            "AAPL",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Info { .. }));
    }

    #[test]
    fn file_number_rejects_garbage() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 5O000\nlookback_days = 7\n")
                .unwrap();
        let port: Option<&dyn ConfigPort> = Some(&adapter);
        assert!(matches!(
            file_number::<f64>(port, "initial_capital"),
            Err(BacktestError::ConfigInvalid { .. })
        ));
        assert_eq!(file_number::<i64>(port, "lookback_days").unwrap(), Some(7));
        assert_eq!(file_number::<i64>(port, "missing").unwrap(), None);
        assert_eq!(file_number::<i64>(None, "lookback_days").unwrap(), None);
    }

    #[test]
    fn date_parse_error_names_key() {
        let err = parse_date("end_date", "2024/01/01").unwrap_err();
        match err {
            BacktestError::ConfigInvalid { key, .. } => assert_eq!(key, "end_date"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
