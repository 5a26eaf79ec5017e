//! Configuration validation.
//!
//! Validates every config field before a signal or backtest run. Missing keys
//! take their defaults; present keys must be in range.

use crate::domain::aggregator::{AggregatorKind, DEFAULT_TAKE_PROFIT_ATR_MULTIPLE};
use crate::domain::backtest::{DEFAULT_LOOKBACK_BARS, DEFAULT_MIN_ENTRY_SCORE};
use crate::domain::error::StockflowError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::simulator::{
    DEFAULT_ACTIVATION_ATR_MULTIPLE, DEFAULT_MAX_HOLD_DAYS, DEFAULT_SLIPPAGE,
    DEFAULT_TRAIL_ATR_MULTIPLE,
};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockflowError> {
    validate_indicator_config(config)?;
    validate_aggregator_config(config)?;
    validate_backtest_config(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StockflowError {
    StockflowError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, StockflowError> {
    let value = config.get_int(section, key, default);
    if value <= 0 {
        return Err(invalid(section, key, format!("{} must be positive", key)));
    }
    Ok(value)
}

fn require_positive_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, StockflowError> {
    let value = config.get_double(section, key, default);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(section, key, format!("{} must be positive", key)));
    }
    Ok(value)
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), StockflowError> {
    let defaults = IndicatorParams::default();
    let section = "indicators";

    for (key, default) in [
        ("rsi_period", defaults.rsi_period),
        ("macd_signal", defaults.macd_signal),
        ("cmf_window", defaults.cmf_window),
        ("atr_period", defaults.atr_period),
        ("structure_half_width", defaults.structure_half_width),
        ("divergence_half_width", defaults.divergence_half_width),
        ("squeeze_lookback", defaults.squeeze_lookback),
    ] {
        require_positive_int(config, section, key, default as i64)?;
    }

    let bb_window = config.get_int(section, "bb_window", defaults.bb_window as i64);
    if bb_window < 2 {
        return Err(invalid(section, "bb_window", "bb_window must be at least 2"));
    }
    let min_history = config.get_int(
        section,
        "squeeze_min_history",
        defaults.squeeze_min_history as i64,
    );
    if min_history < 2 {
        return Err(invalid(
            section,
            "squeeze_min_history",
            "squeeze_min_history must be at least 2",
        ));
    }
    require_positive_double(config, section, "bb_num_std", defaults.bb_num_std)?;

    validate_fast_slow(config, "macd_fast", "macd_slow", defaults.macd_fast, defaults.macd_slow)?;
    validate_fast_slow(
        config,
        "macro_fast",
        "macro_slow",
        defaults.macro_fast,
        defaults.macro_slow,
    )?;
    Ok(())
}

fn validate_fast_slow(
    config: &dyn ConfigPort,
    fast_key: &str,
    slow_key: &str,
    fast_default: usize,
    slow_default: usize,
) -> Result<(), StockflowError> {
    let fast = require_positive_int(config, "indicators", fast_key, fast_default as i64)?;
    let slow = require_positive_int(config, "indicators", slow_key, slow_default as i64)?;
    if fast >= slow {
        return Err(invalid(
            "indicators",
            fast_key,
            format!("{} must be less than {}", fast_key, slow_key),
        ));
    }
    Ok(())
}

pub fn validate_aggregator_config(config: &dyn ConfigPort) -> Result<(), StockflowError> {
    if let Some(name) = config.get_string("aggregator", "strategy") {
        name.parse::<AggregatorKind>()
            .map_err(|reason| invalid("aggregator", "strategy", reason))?;
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StockflowError> {
    let section = "backtest";

    let lookback = config.get_int(section, "lookback_bars", DEFAULT_LOOKBACK_BARS as i64);
    if lookback < 0 {
        return Err(invalid(section, "lookback_bars", "lookback_bars must be non-negative"));
    }
    let min_score = config.get_int(section, "min_entry_score", DEFAULT_MIN_ENTRY_SCORE as i64);
    if min_score < 0 {
        return Err(invalid(
            section,
            "min_entry_score",
            "min_entry_score must be non-negative",
        ));
    }

    let slippage = config.get_double(section, "slippage", DEFAULT_SLIPPAGE);
    if !slippage.is_finite() || slippage < 0.0 {
        return Err(invalid(section, "slippage", "slippage must be non-negative"));
    }

    require_positive_int(config, section, "max_hold_days", DEFAULT_MAX_HOLD_DAYS)?;
    require_positive_double(config, section, "trail_atr_multiple", DEFAULT_TRAIL_ATR_MULTIPLE)?;
    require_positive_double(
        config,
        section,
        "activation_atr_multiple",
        DEFAULT_ACTIVATION_ATR_MULTIPLE,
    )?;
    require_positive_double(
        config,
        section,
        "take_profit_atr_multiple",
        DEFAULT_TAKE_PROFIT_ATR_MULTIPLE,
    )?;
    Ok(())
}
