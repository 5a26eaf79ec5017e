//! Typed settings built from a validated `ConfigPort`.

use chrono::Duration;
use std::path::PathBuf;

use crate::domain::aggregator::{AggregatorKind, DEFAULT_TAKE_PROFIT_ATR_MULTIPLE};
use crate::domain::backtest::{BacktestConfig, DEFAULT_LOOKBACK_BARS, DEFAULT_MIN_ENTRY_SCORE};
use crate::domain::config_validation::validate_config;
use crate::domain::error::StockflowError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::simulator::{
    DEFAULT_ACTIVATION_ATR_MULTIPLE, DEFAULT_MAX_HOLD_DAYS, DEFAULT_SLIPPAGE,
    DEFAULT_TRAIL_ATR_MULTIPLE, SimulatorConfig,
};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub symbols: Vec<String>,
    pub backtest: BacktestConfig,
}

/// Split a comma-separated symbol list, dropping blanks.
pub fn parse_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockflowError> {
        validate_config(config)?;

        let data_dir = config
            .get_string("data", "dir")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let symbols = config
            .get_string("data", "symbols")
            .map(|s| parse_symbols(&s))
            .unwrap_or_default();

        let aggregator = match config.get_string("aggregator", "strategy") {
            Some(name) => name
                .parse::<AggregatorKind>()
                .map_err(|reason| StockflowError::ConfigInvalid {
                    section: "aggregator".into(),
                    key: "strategy".into(),
                    reason,
                })?,
            None => AggregatorKind::default(),
        };

        Ok(Settings {
            data_dir: PathBuf::from(data_dir),
            symbols,
            backtest: BacktestConfig {
                lookback_bars: config.get_int(
                    "backtest",
                    "lookback_bars",
                    DEFAULT_LOOKBACK_BARS as i64,
                ) as usize,
                min_entry_score: config.get_int(
                    "backtest",
                    "min_entry_score",
                    DEFAULT_MIN_ENTRY_SCORE as i64,
                ) as u32,
                take_profit_atr_multiple: config.get_double(
                    "backtest",
                    "take_profit_atr_multiple",
                    DEFAULT_TAKE_PROFIT_ATR_MULTIPLE,
                ),
                aggregator,
                indicators: indicator_params(config),
                simulator: SimulatorConfig {
                    slippage: config.get_double("backtest", "slippage", DEFAULT_SLIPPAGE),
                    max_hold: Duration::days(config.get_int(
                        "backtest",
                        "max_hold_days",
                        DEFAULT_MAX_HOLD_DAYS,
                    )),
                    trail_atr_multiple: config.get_double(
                        "backtest",
                        "trail_atr_multiple",
                        DEFAULT_TRAIL_ATR_MULTIPLE,
                    ),
                    activation_atr_multiple: config.get_double(
                        "backtest",
                        "activation_atr_multiple",
                        DEFAULT_ACTIVATION_ATR_MULTIPLE,
                    ),
                },
            },
        })
    }
}

fn indicator_params(config: &dyn ConfigPort) -> IndicatorParams {
    let d = IndicatorParams::default();
    let int = |key: &str, default: usize| config.get_int("indicators", key, default as i64) as usize;

    IndicatorParams {
        rsi_period: int("rsi_period", d.rsi_period),
        macd_fast: int("macd_fast", d.macd_fast),
        macd_slow: int("macd_slow", d.macd_slow),
        macd_signal: int("macd_signal", d.macd_signal),
        bb_window: int("bb_window", d.bb_window),
        bb_num_std: config.get_double("indicators", "bb_num_std", d.bb_num_std),
        cmf_window: int("cmf_window", d.cmf_window),
        atr_period: int("atr_period", d.atr_period),
        structure_half_width: int("structure_half_width", d.structure_half_width),
        divergence_half_width: int("divergence_half_width", d.divergence_half_width),
        squeeze_lookback: int("squeeze_lookback", d.squeeze_lookback),
        squeeze_min_history: int("squeeze_min_history", d.squeeze_min_history),
        macro_fast: int("macro_fast", d.macro_fast),
        macro_slow: int("macro_slow", d.macro_slow),
    }
}
