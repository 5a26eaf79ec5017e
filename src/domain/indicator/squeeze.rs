//! Bollinger squeeze and expansion.
//!
//! Percentile rank of the current band width within the trailing
//! min(available, lookback) widths: the fraction of widths <= current.
//! Squeeze when the rank is below 0.25; expanding when the width grew on the
//! latest bar.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::bollinger::band_width_series;
use crate::domain::indicator::check_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_LOOKBACK: usize = 100;
pub const DEFAULT_MIN_HISTORY: usize = 20;
pub const SQUEEZE_PERCENTILE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqueezeResult {
    pub band_width: f64,
    pub prev_band_width: f64,
    pub percentile: f64,
    pub is_squeeze: bool,
    pub is_expanding: bool,
}

impl SqueezeResult {
    pub fn is_squeeze_expanding(&self) -> bool {
        self.is_squeeze && self.is_expanding
    }
}

pub fn calculate_squeeze(
    bars: &[OhlcvBar],
    window: usize,
    num_std: f64,
    lookback: usize,
    min_history: usize,
) -> Result<SqueezeResult, IndicatorError> {
    if window < 2 || lookback == 0 || min_history < 2 {
        return Err(IndicatorError::InvalidInput {
            indicator: "squeeze",
            reason: format!(
                "invalid window={} lookback={} min_history={}",
                window, lookback, min_history
            ),
        });
    }
    let need = window + min_history - 1;
    check_bars(bars, "squeeze", need)?;

    let widths: Vec<f64> = band_width_series(bars, window, num_std)
        .into_iter()
        .flatten()
        .collect();
    if widths.len() < min_history {
        return Err(IndicatorError::insufficient("squeeze", bars.len(), need));
    }

    let trailing = &widths[widths.len() - lookback.min(widths.len())..];
    let band_width = widths[widths.len() - 1];
    let prev_band_width = widths[widths.len() - 2];
    let at_or_below = trailing.iter().filter(|&&w| w <= band_width).count();
    let percentile = at_or_below as f64 / trailing.len() as f64;
    let is_squeeze = percentile < SQUEEZE_PERCENTILE;

    Ok(SqueezeResult {
        band_width,
        prev_band_width,
        percentile,
        is_squeeze,
        is_expanding: band_width > prev_band_width,
    })
}
