//! Technical indicators over bar prefixes.
//!
//! Every indicator is a pure function of a bar slice returning its value for
//! the latest bar, or an `IndicatorError`:
//! - `IndicatorKind`: indicator identity, used to key failures
//! - `IndicatorResult`: tagged union of the per-indicator result records
//! - `IndicatorParams`: every period, window and multiplier in one place
//! - `IndicatorSnapshot`: all indicators for one evaluation

pub mod atr;
pub mod bollinger;
pub mod cmf;
pub mod divergence;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod snapshot;
pub mod squeeze;
pub mod structure;

use serde::Serialize;
use std::fmt;

use crate::domain::error::IndicatorError;
use crate::domain::ohlcv::OhlcvBar;

pub use snapshot::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    Bollinger,
    Cmf,
    Structure,
    Divergence,
    Squeeze,
    Atr,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Bollinger => "bollinger",
            IndicatorKind::Cmf => "cmf",
            IndicatorKind::Structure => "structure",
            IndicatorKind::Divergence => "divergence",
            IndicatorKind::Squeeze => "squeeze",
            IndicatorKind::Atr => "atr",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorResult {
    Rsi(rsi::RsiResult),
    Macd(macd::MacdResult),
    Bollinger(bollinger::BollingerResult),
    Cmf(cmf::CmfResult),
    Structure(structure::StructureResult),
    Divergence(divergence::DivergenceResult),
    Squeeze(squeeze::SqueezeResult),
    Atr(atr::AtrResult),
}

impl IndicatorResult {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorResult::Rsi(_) => IndicatorKind::Rsi,
            IndicatorResult::Macd(_) => IndicatorKind::Macd,
            IndicatorResult::Bollinger(_) => IndicatorKind::Bollinger,
            IndicatorResult::Cmf(_) => IndicatorKind::Cmf,
            IndicatorResult::Structure(_) => IndicatorKind::Structure,
            IndicatorResult::Divergence(_) => IndicatorKind::Divergence,
            IndicatorResult::Squeeze(_) => IndicatorKind::Squeeze,
            IndicatorResult::Atr(_) => IndicatorKind::Atr,
        }
    }

    /// Named scalar values for report metadata.
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        match self {
            IndicatorResult::Rsi(r) => vec![("rsi", r.rsi), ("rsi_smooth", r.rsi_smooth)],
            IndicatorResult::Macd(m) => vec![
                ("macd", m.macd),
                ("macd_signal", m.signal),
                ("macd_histogram", m.histogram),
            ],
            IndicatorResult::Bollinger(b) => vec![
                ("bb_upper", b.upper),
                ("bb_middle", b.middle),
                ("bb_lower", b.lower),
                ("bb_width", b.band_width),
            ],
            IndicatorResult::Cmf(c) => vec![("cmf", c.cmf)],
            IndicatorResult::Structure(s) => s
                .latest_trough
                .iter()
                .map(|t| ("structure_trough", t.price))
                .chain(s.latest_peak.iter().map(|p| ("structure_peak", p.price)))
                .collect(),
            IndicatorResult::Divergence(d) => {
                vec![("divergence", if d.bullish { 1.0 } else { 0.0 })]
            }
            IndicatorResult::Squeeze(s) => vec![("squeeze_percentile", s.percentile)],
            IndicatorResult::Atr(a) => vec![("atr", a.atr)],
        }
    }
}

/// Periods and windows for every indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_window: usize,
    pub bb_num_std: f64,
    pub cmf_window: usize,
    pub atr_period: usize,
    pub structure_half_width: usize,
    pub divergence_half_width: usize,
    pub squeeze_lookback: usize,
    pub squeeze_min_history: usize,
    pub macro_fast: usize,
    pub macro_slow: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bb_window: bollinger::DEFAULT_WINDOW,
            bb_num_std: bollinger::DEFAULT_NUM_STD,
            cmf_window: cmf::DEFAULT_WINDOW,
            atr_period: atr::DEFAULT_PERIOD,
            structure_half_width: structure::DEFAULT_HALF_WIDTH,
            divergence_half_width: divergence::DEFAULT_HALF_WIDTH,
            squeeze_lookback: squeeze::DEFAULT_LOOKBACK,
            squeeze_min_history: squeeze::DEFAULT_MIN_HISTORY,
            macro_fast: crate::domain::macro_regime::DEFAULT_FAST,
            macro_slow: crate::domain::macro_regime::DEFAULT_SLOW,
        }
    }
}

/// Shared input checks: non-empty, finite, at least `need` bars.
pub(crate) fn check_bars(
    bars: &[OhlcvBar],
    indicator: &'static str,
    need: usize,
) -> Result<(), IndicatorError> {
    if bars.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }
    if let Some(bad) = bars.iter().find(|b| !b.is_finite()) {
        return Err(IndicatorError::InvalidInput {
            indicator,
            reason: format!("non-finite value at {}", bad.timestamp),
        });
    }
    if bars.len() < need {
        return Err(IndicatorError::insufficient(indicator, bars.len(), need));
    }
    Ok(())
}
