//! Swing structure: troughs and peaks from a centered rolling window.
//!
//! Bar `i` is a trough when its low equals the minimum low over
//! `[i - w, i + w]`. The full window is required, so the last `w` bars of a
//! prefix never qualify. A run of equal adjacent lows is a single trough at
//! its first bar. Peaks are found the same way on highs.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::check_bars;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_HALF_WIDTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureStatus {
    HigherLow,
    LowerLow,
    Building,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureResult {
    pub status: StructureStatus,
    pub latest_trough: Option<SwingPoint>,
    pub prior_trough: Option<SwingPoint>,
    pub latest_peak: Option<SwingPoint>,
    pub trough_count: usize,
}

impl StructureResult {
    pub fn is_higher_low(&self) -> bool {
        self.status == StructureStatus::HigherLow
    }

    /// Most recent structural low, used as the protective stop.
    pub fn stop_level(&self) -> Option<f64> {
        self.latest_trough.as_ref().map(|t| t.price)
    }
}

fn centered_extrema(values: &[f64], half_width: usize, is_extreme: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    if n < 2 * half_width + 1 {
        return Vec::new();
    }

    let mut points = Vec::new();
    let mut in_plateau = false;
    for i in half_width..n - half_width {
        let window = &values[i - half_width..=i + half_width];
        let v = values[i];
        let qualifies = !window.iter().any(|&other| is_extreme(other, v));
        // equal neighbour in the same qualifying plateau
        if qualifies && !(in_plateau && values[i - 1] == v) {
            points.push(i);
        }
        in_plateau = qualifies;
    }
    points
}

/// Indices of swing lows.
pub fn swing_lows(bars: &[OhlcvBar], half_width: usize) -> Vec<usize> {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    centered_extrema(&lows, half_width, |other, v| other < v)
}

/// Indices of swing highs.
pub fn swing_highs(bars: &[OhlcvBar], half_width: usize) -> Vec<usize> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    centered_extrema(&highs, half_width, |other, v| other > v)
}

pub fn calculate_structure(
    bars: &[OhlcvBar],
    half_width: usize,
) -> Result<StructureResult, IndicatorError> {
    if half_width == 0 {
        return Err(IndicatorError::InvalidInput {
            indicator: "structure",
            reason: "half width must be positive".into(),
        });
    }
    check_bars(bars, "structure", 2 * half_width + 1)?;

    let point = |i: usize, price: f64| SwingPoint {
        index: i,
        timestamp: bars[i].timestamp,
        price,
    };

    let troughs = swing_lows(bars, half_width);
    let peaks = swing_highs(bars, half_width);

    let latest_trough = troughs.last().map(|&i| point(i, bars[i].low));
    let prior_trough = troughs
        .len()
        .checked_sub(2)
        .map(|k| point(troughs[k], bars[troughs[k]].low));
    let latest_peak = peaks.last().map(|&i| point(i, bars[i].high));

    let status = match (&latest_trough, &prior_trough) {
        (Some(latest), Some(prior)) if latest.price > prior.price => StructureStatus::HigherLow,
        (Some(_), Some(_)) => StructureStatus::LowerLow,
        _ => StructureStatus::Building,
    };

    Ok(StructureResult {
        status,
        latest_trough,
        prior_trough,
        latest_peak,
        trough_count: troughs.len(),
    })
}
