//! Chaikin Money Flow.
//!
//! Multiplier = ((C - L) - (H - C)) / (H - L), 0 for zero-range bars.
//! CMF = Σ(multiplier × volume) / Σ(volume) over the last `window` bars,
//! 0 when the window traded no volume.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmfResult {
    pub cmf: f64,
}

pub fn calculate_cmf(bars: &[OhlcvBar], window: usize) -> Result<CmfResult, IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "cmf",
            reason: "window must be positive".into(),
        });
    }
    check_bars(bars, "cmf", window)?;

    let slice = &bars[bars.len() - window..];
    let flow: f64 = slice
        .iter()
        .map(|b| b.money_flow_multiplier() * b.volume)
        .sum();
    let volume: f64 = slice.iter().map(|b| b.volume).sum();

    let cmf = if volume == 0.0 { 0.0 } else { flow / volume };
    Ok(CmfResult { cmf })
}
