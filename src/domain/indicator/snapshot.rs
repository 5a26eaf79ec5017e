//! Every indicator for one evaluation point.

use chrono::NaiveDateTime;

use crate::domain::error::IndicatorError;
use crate::domain::indicator::atr::{AtrResult, calculate_atr};
use crate::domain::indicator::bollinger::{BollingerResult, calculate_bollinger};
use crate::domain::indicator::cmf::{CmfResult, calculate_cmf};
use crate::domain::indicator::divergence::{DivergenceResult, calculate_divergence};
use crate::domain::indicator::macd::{MacdResult, calculate_macd};
use crate::domain::indicator::rsi::{RsiResult, calculate_rsi};
use crate::domain::indicator::squeeze::{SqueezeResult, calculate_squeeze};
use crate::domain::indicator::structure::{StructureResult, calculate_structure};
use crate::domain::indicator::{IndicatorKind, IndicatorParams, IndicatorResult};
use crate::domain::macro_regime::{MacroRegime, evaluate_macro};
use crate::domain::ohlcv::OhlcvBar;

/// Indicator values at the last bar of an hourly prefix.
///
/// The macro regime is required. Hourly indicators that fail are left as
/// `None` and recorded in `unavailable`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub macro_regime: MacroRegime,
    pub rsi: Option<RsiResult>,
    pub macd: Option<MacdResult>,
    pub bollinger: Option<BollingerResult>,
    pub cmf: Option<CmfResult>,
    pub structure: Option<StructureResult>,
    pub divergence: Option<DivergenceResult>,
    pub squeeze: Option<SqueezeResult>,
    pub atr: Option<AtrResult>,
    pub unavailable: Vec<(IndicatorKind, IndicatorError)>,
}

fn keep<T>(
    kind: IndicatorKind,
    result: Result<T, IndicatorError>,
    unavailable: &mut Vec<(IndicatorKind, IndicatorError)>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            unavailable.push((kind, e));
            None
        }
    }
}

impl IndicatorSnapshot {
    pub fn compute(
        daily: &[OhlcvBar],
        hourly: &[OhlcvBar],
        params: &IndicatorParams,
    ) -> Result<Self, IndicatorError> {
        let macro_regime = evaluate_macro(daily, params.macro_fast, params.macro_slow)?;
        let last = hourly.last().ok_or(IndicatorError::EmptySeries)?;

        let mut unavailable = Vec::new();
        let rsi = keep(
            IndicatorKind::Rsi,
            calculate_rsi(hourly, params.rsi_period),
            &mut unavailable,
        );
        let macd = keep(
            IndicatorKind::Macd,
            calculate_macd(hourly, params.macd_fast, params.macd_slow, params.macd_signal),
            &mut unavailable,
        );
        let bollinger = keep(
            IndicatorKind::Bollinger,
            calculate_bollinger(hourly, params.bb_window, params.bb_num_std),
            &mut unavailable,
        );
        let cmf = keep(
            IndicatorKind::Cmf,
            calculate_cmf(hourly, params.cmf_window),
            &mut unavailable,
        );
        let structure = keep(
            IndicatorKind::Structure,
            calculate_structure(hourly, params.structure_half_width),
            &mut unavailable,
        );
        let divergence = keep(
            IndicatorKind::Divergence,
            calculate_divergence(hourly, params.rsi_period, params.divergence_half_width),
            &mut unavailable,
        );
        let squeeze = keep(
            IndicatorKind::Squeeze,
            calculate_squeeze(
                hourly,
                params.bb_window,
                params.bb_num_std,
                params.squeeze_lookback,
                params.squeeze_min_history,
            ),
            &mut unavailable,
        );
        let atr = keep(
            IndicatorKind::Atr,
            calculate_atr(hourly, params.atr_period),
            &mut unavailable,
        );

        Ok(Self {
            timestamp: last.timestamp,
            price: last.close,
            macro_regime,
            rsi,
            macd,
            bollinger,
            cmf,
            structure,
            divergence,
            squeeze,
            atr,
            unavailable,
        })
    }

    pub fn is_available(&self, kind: IndicatorKind) -> bool {
        !self.unavailable.iter().any(|(k, _)| *k == kind)
    }

    /// The available results as tagged records.
    pub fn results(&self) -> Vec<IndicatorResult> {
        let mut out = Vec::new();
        out.extend(self.rsi.clone().map(IndicatorResult::Rsi));
        out.extend(self.macd.clone().map(IndicatorResult::Macd));
        out.extend(self.bollinger.clone().map(IndicatorResult::Bollinger));
        out.extend(self.cmf.clone().map(IndicatorResult::Cmf));
        out.extend(self.structure.clone().map(IndicatorResult::Structure));
        out.extend(self.divergence.clone().map(IndicatorResult::Divergence));
        out.extend(self.squeeze.clone().map(IndicatorResult::Squeeze));
        out.extend(self.atr.clone().map(IndicatorResult::Atr));
        out
    }

    /// A snapshot with the given regime and no hourly indicators, for
    /// building aggregator scenarios.
    pub fn bare(timestamp: NaiveDateTime, price: f64, macro_regime: MacroRegime) -> Self {
        Self {
            timestamp,
            price,
            macro_regime,
            rsi: None,
            macd: None,
            bollinger: None,
            cmf: None,
            structure: None,
            divergence: None,
            squeeze: None,
            atr: None,
            unavailable: Vec::new(),
        }
    }
}
