//! Bollinger Bands.
//!
//! - Middle: rolling mean of close over `window` bars
//! - Upper/Lower: middle ± num_std × rolling sample standard deviation (n-1)
//! - Width: (upper - lower) / middle, 0 when middle is 0
//!
//! Default parameters: window=20, num_std=2.0.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;

const SQUEEZE_RATIO: f64 = 0.5;
const OVERBOUGHT_FACTOR: f64 = 0.98;
const OVERSOLD_FACTOR: f64 = 1.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Band {
    pub fn width(&self) -> f64 {
        if self.middle == 0.0 {
            0.0
        } else {
            (self.upper - self.lower) / self.middle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub price: f64,
    pub band_width: f64,
    /// Mean width over the last `window` bars, once available.
    pub avg_band_width: Option<f64>,
    pub is_squeeze: bool,
    pub is_overbought: bool,
    pub is_oversold: bool,
    pub crossed_above_middle: bool,
    pub crossed_below_middle: bool,
}

impl BollingerResult {
    /// Relative distance of price above the lower band.
    pub fn distance_from_lower(&self) -> f64 {
        if self.lower == 0.0 {
            0.0
        } else {
            (self.price - self.lower) / self.lower
        }
    }
}

/// Bands aligned with `bars`; `None` during warmup.
pub fn bollinger_series(bars: &[OhlcvBar], window: usize, num_std: f64) -> Vec<Option<Band>> {
    let mut values = Vec::with_capacity(bars.len());
    if window < 2 {
        values.resize(bars.len(), None);
        return values;
    }

    for i in 0..bars.len() {
        if i + 1 < window {
            values.push(None);
            continue;
        }
        let slice = &bars[i + 1 - window..=i];
        let middle: f64 = slice.iter().map(|b| b.close).sum::<f64>() / window as f64;
        let variance: f64 = slice
            .iter()
            .map(|b| {
                let diff = b.close - middle;
                diff * diff
            })
            .sum::<f64>()
            / (window - 1) as f64;
        let stddev = variance.sqrt();

        values.push(Some(Band {
            upper: middle + num_std * stddev,
            middle,
            lower: middle - num_std * stddev,
        }));
    }
    values
}

/// Band width aligned with `bars`; `None` during warmup.
pub fn band_width_series(bars: &[OhlcvBar], window: usize, num_std: f64) -> Vec<Option<f64>> {
    bollinger_series(bars, window, num_std)
        .into_iter()
        .map(|b| b.map(|band| band.width()))
        .collect()
}

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    window: usize,
    num_std: f64,
) -> Result<BollingerResult, IndicatorError> {
    if window < 2 || !num_std.is_finite() || num_std <= 0.0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "bollinger",
            reason: format!("invalid window={} num_std={}", window, num_std),
        });
    }
    check_bars(bars, "bollinger", window + 1)?;

    let bands = bollinger_series(bars, window, num_std);
    let n = bars.len();
    let (Some(current), Some(previous)) = (bands[n - 1], bands[n - 2]) else {
        return Err(IndicatorError::insufficient("bollinger", n, window + 1));
    };

    let price = bars[n - 1].close;
    let price_prev = bars[n - 2].close;
    let band_width = current.width();

    let recent_widths: Vec<f64> = bands[n.saturating_sub(window)..]
        .iter()
        .filter_map(|b| b.map(|band| band.width()))
        .collect();
    let avg_band_width = if recent_widths.len() == window {
        Some(recent_widths.iter().sum::<f64>() / window as f64)
    } else {
        None
    };
    let is_squeeze = avg_band_width.is_some_and(|avg| band_width < avg * SQUEEZE_RATIO);

    Ok(BollingerResult {
        upper: current.upper,
        middle: current.middle,
        lower: current.lower,
        price,
        band_width,
        avg_band_width,
        is_squeeze,
        is_overbought: price >= current.upper * OVERBOUGHT_FACTOR,
        is_oversold: price <= current.lower * OVERSOLD_FACTOR,
        crossed_above_middle: price_prev < previous.middle && price > current.middle,
        crossed_below_middle: price_prev > previous.middle && price < current.middle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::closes_to_bars;

    #[test]
    fn bollinger_warmup() {
        let bars = closes_to_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = bollinger_series(&bars, 3, 2.0);

        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2].is_some());
        assert!(series[4].is_some());
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bars = closes_to_bars(&[10.0, 20.0, 30.0]);
        let band = bollinger_series(&bars, 3, 2.0)[2].unwrap();

        // sample variance of 10,20,30 = 100
        assert!((band.middle - 20.0).abs() < 1e-10);
        assert!((band.upper - 40.0).abs() < 1e-10);
        assert!((band.lower - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_constant_values_have_zero_width() {
        let bars = closes_to_bars(&[100.0; 10]);
        let result = calculate_bollinger(&bars, 5, 2.0).unwrap();
        assert!((result.upper - 100.0).abs() < f64::EPSILON);
        assert!((result.lower - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.band_width, 0.0);
        assert!(!result.is_squeeze);
    }

    #[test]
    fn zero_middle_gives_zero_width() {
        let band = Band {
            upper: 1.0,
            middle: 0.0,
            lower: -1.0,
        };
        assert_eq!(band.width(), 0.0);
    }

    #[test]
    fn bollinger_symmetry() {
        let bars = closes_to_bars(&[10.0, 20.0, 30.0, 25.0]);
        let result = calculate_bollinger(&bars, 3, 2.0).unwrap();
        let up = result.upper - result.middle;
        let down = result.middle - result.lower;
        assert!((up - down).abs() < 1e-10);
    }

    #[test]
    fn bollinger_insufficient_history() {
        let bars = closes_to_bars(&[10.0, 20.0, 30.0]);
        assert!(calculate_bollinger(&bars, 3, 2.0).unwrap_err().is_insufficient());
    }

    #[test]
    fn crossed_above_middle_two_bar_rule() {
        // previous: 10 < mean(10,11,10); now: 20 > mean(11,10,20)
        let bars = closes_to_bars(&[10.0, 10.0, 11.0, 10.0, 20.0]);
        let result = calculate_bollinger(&bars, 3, 2.0).unwrap();
        assert!(result.crossed_above_middle);
        assert!(!result.crossed_below_middle);
    }

    #[test]
    fn crossed_below_middle() {
        let bars = closes_to_bars(&[10.0, 10.0, 9.0, 10.0, 2.0]);
        let result = calculate_bollinger(&bars, 3, 2.0).unwrap();
        assert!(result.crossed_below_middle);
        assert!(!result.crossed_above_middle);
    }

    #[test]
    fn squeeze_after_volatility_collapse() {
        let mut closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 90.0 } else { 110.0 })
            .collect();
        closes.extend(std::iter::repeat_n(100.0, 5));
        let result = calculate_bollinger(&closes_to_bars(&closes), 5, 2.0).unwrap();
        assert!(result.avg_band_width.is_some());
        assert!(result.is_squeeze);
    }

    #[test]
    fn oversold_near_lower_band() {
        let bars = closes_to_bars(&[100.0, 100.0, 100.0, 100.0, 100.0, 80.0]);
        let result = calculate_bollinger(&bars, 5, 1.0).unwrap();
        assert!(result.is_oversold);
        assert!(!result.is_overbought);
        assert!(result.distance_from_lower() <= 0.02);
    }
}
