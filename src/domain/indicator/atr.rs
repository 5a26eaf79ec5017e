//! Average True Range.
//!
//! TR = max(H - L, |H - prev C|, |L - prev C|), with the first bar's TR = H - L.
//! ATR = simple rolling mean of TR over `period` bars.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtrResult {
    pub atr: f64,
}

fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// ATR aligned with `bars`; `None` during warmup.
pub fn atr_series(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }
    let tr = true_ranges(bars);
    let mut out = Vec::with_capacity(bars.len());
    let mut sum = 0.0;
    for i in 0..tr.len() {
        sum += tr[i];
        if i >= period {
            sum -= tr[i - period];
        }
        out.push(if i + 1 >= period {
            Some(sum / period as f64)
        } else {
            None
        });
    }
    out
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Result<AtrResult, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "atr",
            reason: "period must be positive".into(),
        });
    }
    check_bars(bars, "atr", period)?;

    let tr = true_ranges(bars);
    let atr = tr[tr.len() - period..].iter().sum::<f64>() / period as f64;
    Ok(AtrResult { atr })
}
