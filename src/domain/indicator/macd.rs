//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Crossovers are judged over the last four (macd, signal) pairs.

use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::indicator::ema::{calculate_ema, ema_values};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

const CROSSOVER_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    BullishCrossover,
    BearishCrossover,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    StrongBullish,
    ModerateBullish,
    WeakBearish,
    StrongBearish,
}

impl TrendStrength {
    pub fn from_histogram(histogram: f64) -> Self {
        if histogram > 0.5 {
            TrendStrength::StrongBullish
        } else if histogram > 0.0 {
            TrendStrength::ModerateBullish
        } else if histogram > -0.5 {
            TrendStrength::WeakBearish
        } else {
            TrendStrength::StrongBearish
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            TrendStrength::StrongBullish | TrendStrength::ModerateBullish
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub crossover: Crossover,
    pub trend_strength: TrendStrength,
    /// Both lines rose on the latest bar.
    pub momentum_up: bool,
    /// Bullish crossover with the lower line still rising.
    pub is_potential_entry: bool,
}

/// Classify a crossover from four (macd, signal) pairs, oldest first.
///
/// Bullish: MACD below signal on each of the first three, above on the last.
/// Bearish is the mirror.
pub fn classify_crossover(pairs: &[(f64, f64); CROSSOVER_WINDOW]) -> Crossover {
    let (prior, now) = pairs.split_at(CROSSOVER_WINDOW - 1);
    let (m0, s0) = now[0];

    if prior.iter().all(|(m, s)| m < s) && m0 > s0 {
        Crossover::BullishCrossover
    } else if prior.iter().all(|(m, s)| m > s) && m0 < s0 {
        Crossover::BearishCrossover
    } else {
        Crossover::None
    }
}

/// MACD and signal lines aligned with `bars`.
pub fn macd_lines(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>) {
    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);
    (macd_line, signal_line)
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdResult, IndicatorError> {
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return Err(IndicatorError::InvalidInput {
            indicator: "macd",
            reason: format!(
                "invalid periods fast={} slow={} signal={}",
                fast, slow, signal_period
            ),
        });
    }
    check_bars(bars, "macd", slow.max(CROSSOVER_WINDOW))?;

    let (macd_line, signal_line) = macd_lines(bars, fast, slow, signal_period);
    let n = bars.len();

    let mut pairs = [(0.0, 0.0); CROSSOVER_WINDOW];
    for (k, pair) in pairs.iter_mut().enumerate() {
        let i = n - CROSSOVER_WINDOW + k;
        *pair = (macd_line[i], signal_line[i]);
    }
    let crossover = classify_crossover(&pairs);

    let (m0, s0) = pairs[CROSSOVER_WINDOW - 1];
    let (m1, s1) = pairs[CROSSOVER_WINDOW - 2];
    let histogram = m0 - s0;

    let momentum_up = m0 > m1 && s0 > s1;
    let lower_line_rising = (m0 < s0 && m0 > m1) || (s0 <= m0 && s0 > s1);
    let is_potential_entry = crossover == Crossover::BullishCrossover && lower_line_rising;

    Ok(MacdResult {
        macd: m0,
        signal: s0,
        histogram,
        crossover,
        trend_strength: TrendStrength::from_histogram(histogram),
        momentum_up,
        is_potential_entry,
    })
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> Result<MacdResult, IndicatorError> {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
