//! Daily trend gate.
//!
//! Bullish iff the latest daily close is above EMA(slow) and EMA(fast) is
//! above EMA(slow). Defaults: fast=50, slow=200.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 50;
pub const DEFAULT_SLOW: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroRegime {
    pub bullish: bool,
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}

pub fn evaluate_macro(
    daily: &[OhlcvBar],
    fast: usize,
    slow: usize,
) -> Result<MacroRegime, IndicatorError> {
    if fast == 0 || fast >= slow {
        return Err(IndicatorError::InvalidInput {
            indicator: "macro",
            reason: format!("invalid periods fast={} slow={}", fast, slow),
        });
    }
    check_bars(daily, "macro", slow)?;

    let close = daily[daily.len() - 1].close;
    let ema_fast = calculate_ema(daily, fast)[daily.len() - 1];
    let ema_slow = calculate_ema(daily, slow)[daily.len() - 1];

    Ok(MacroRegime {
        bullish: close > ema_slow && ema_fast > ema_slow,
        close,
        ema_fast,
        ema_slow,
    })
}
