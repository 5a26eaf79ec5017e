//! RSI (Relative Strength Index).
//!
//! Wilder smoothing via an EMA with a = 1/period over close-to-close gains and
//! losses, seeded from the first change, with no output before `period`
//! changes have been seen.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, or 50 on a completely flat tape.
//!
//! A 5-span EMA of the RSI line is reported alongside for momentum
//! comparison.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::indicator::ema::{ewm_alpha, span_alpha};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;
pub const SMOOTHING_SPAN: usize = 5;

const OVERSOLD: f64 = 30.0;
const MOMENTUM_FLOOR: f64 = 40.0;
const MOMENTUM_CEILING: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    /// RSI below 30 with the smoothed line above it.
    OversoldRecovering,
    /// RSI in 40..=70 pulling away above its smoothed line.
    BullishMomentum,
    Neutral,
}

impl RsiSignal {
    pub fn classify(rsi: f64, rsi_smooth: f64) -> Self {
        if rsi < OVERSOLD && rsi_smooth > rsi {
            RsiSignal::OversoldRecovering
        } else if (MOMENTUM_FLOOR..=MOMENTUM_CEILING).contains(&rsi) && rsi_smooth < rsi {
            RsiSignal::BullishMomentum
        } else {
            RsiSignal::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiResult {
    pub rsi: f64,
    pub rsi_smooth: f64,
    pub signal: RsiSignal,
}

impl RsiResult {
    pub fn is_favorable(&self) -> bool {
        self.signal != RsiSignal::Neutral
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Full RSI line aligned with `bars`; `None` during warmup.
pub fn rsi_series(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = bars[i].close - bars[i - 1].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = ewm_alpha(&gains, alpha, period);
    let avg_loss = ewm_alpha(&losses, alpha, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => Some(rsi_from_averages(*g, *l)),
            _ => None,
        })
        .collect()
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Result<RsiResult, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "rsi",
            reason: "period must be positive".into(),
        });
    }
    check_bars(bars, "rsi", period + 1)?;

    let series = rsi_series(bars, period);
    let smooth = ewm_alpha(&series, span_alpha(SMOOTHING_SPAN), 1);

    let rsi = series
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| IndicatorError::insufficient("rsi", bars.len(), period + 1))?;
    let rsi_smooth = smooth.last().copied().flatten().unwrap_or(rsi);

    Ok(RsiResult {
        rsi,
        rsi_smooth,
        signal: RsiSignal::classify(rsi, rsi_smooth),
    })
}
