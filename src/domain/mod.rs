//! Core domain types and logic.

pub mod backtest;
pub mod calendar;
pub mod config_validation;
pub mod decision;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod universe;
