//! backtester: replays per-date trading decisions against a cash-and-shares
//! portfolio and reports how the strategy would have performed.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod telemetry;
