//! Core domain types and logic.

pub mod aggregator;
pub mod backtest;
pub mod bar_series;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod macro_regime;
pub mod metrics;
pub mod ohlcv;
pub mod settings;
pub mod signal;
pub mod simulator;
pub mod trade;
