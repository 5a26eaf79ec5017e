//! Bullish RSI divergence.
//!
//! Price makes a lower swing low while RSI at the same bars makes a higher
//! low. Swing lows use a 5-bar centered window (half-width 2) on lows.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::indicator::rsi::rsi_series;
use crate::domain::indicator::structure::swing_lows;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_HALF_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergenceResult {
    pub bullish: bool,
    /// (prior, latest) swing-low prices.
    pub price_lows: Option<(f64, f64)>,
    /// RSI at the same two bars.
    pub rsi_lows: Option<(f64, f64)>,
}

impl DivergenceResult {
    fn none() -> Self {
        Self {
            bullish: false,
            price_lows: None,
            rsi_lows: None,
        }
    }
}

pub fn calculate_divergence(
    bars: &[OhlcvBar],
    rsi_period: usize,
    half_width: usize,
) -> Result<DivergenceResult, IndicatorError> {
    if rsi_period == 0 || half_width == 0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "divergence",
            reason: format!("invalid rsi_period={} half_width={}", rsi_period, half_width),
        });
    }
    check_bars(bars, "divergence", (rsi_period + 1).max(2 * half_width + 1))?;

    let rsi = rsi_series(bars, rsi_period);
    let lows: Vec<(usize, f64)> = swing_lows(bars, half_width)
        .into_iter()
        .filter_map(|i| rsi[i].map(|r| (i, r)))
        .collect();

    let [.., (i1, r1), (i2, r2)] = lows.as_slice() else {
        return Ok(DivergenceResult::none());
    };

    let p1 = bars[*i1].low;
    let p2 = bars[*i2].low;

    Ok(DivergenceResult {
        bullish: p2 < p1 && r2 > r1,
        price_lows: Some((p1, p2)),
        rsi_lows: Some((*r1, *r2)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::closes_to_bars;

    fn falling_then_recovering() -> Vec<f64> {
        // hard sell-off into the first low, gentle drift into a lower second
        // low: price undercuts while momentum improves
        let mut closes: Vec<f64> = (0..20).map(|i| 120.0 - i as f64 * 0.2).collect();
        closes.extend([110.0, 100.0, 90.0, 80.0, 92.0, 96.0, 98.0]);
        closes.extend([97.0, 95.0, 93.0, 91.0, 89.0, 79.0, 85.0, 88.0, 90.0]);
        closes
    }

    #[test]
    fn detects_bullish_divergence() {
        let bars = closes_to_bars(&falling_then_recovering());
        let result = calculate_divergence(&bars, 14, 2).unwrap();
        let (p1, p2) = result.price_lows.unwrap();
        let (r1, r2) = result.rsi_lows.unwrap();
        assert!(p2 < p1);
        assert!(r2 > r1, "rsi lows {} -> {}", r1, r2);
        assert!(result.bullish);
    }

    #[test]
    fn no_divergence_on_steady_uptrend() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let result = calculate_divergence(&closes_to_bars(&closes), 14, 2).unwrap();
        assert!(!result.bullish);
        assert!(result.price_lows.is_none());
    }

    #[test]
    fn divergence_needs_rsi_history() {
        let bars = closes_to_bars(&[100.0; 10]);
        assert!(calculate_divergence(&bars, 14, 2).unwrap_err().is_insufficient());
    }
}
