//! stockflow: multi-timeframe equity signal engine and backtester.
//!
//! Hexagonal architecture: indicators, aggregation, simulation and the
//! backtest driver live in [`domain`], port traits in [`ports`], file-backed
//! implementations in [`adapters`], and the command-line wiring in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
