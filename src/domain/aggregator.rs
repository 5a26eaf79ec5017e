//! Signal aggregation strategies.
//!
//! `SignalAggregator` turns one `IndicatorSnapshot` into a `SignalScore`.
//! Three strategies are available, selected by `AggregatorKind`:
//! - `Hierarchical`: macro gate, then structure, then trigger layer
//! - `Confluence`: count of four MACD/Bollinger confluence checks
//! - `Volatility`: gated volatility, volume and trend chain
//!
//! Indicators missing from the snapshot award nothing.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::indicator::macd::Crossover;
use crate::domain::signal::{Recommendation, SignalScore, Strength};

pub const DEFAULT_TAKE_PROFIT_ATR_MULTIPLE: f64 = 1.5;

const STRUCTURE_POINTS: u32 = 3;
const DIVERGENCE_POINTS: u32 = 2;
const SQUEEZE_POINTS: u32 = 2;
const CMF_POINTS: u32 = 1;
const MACD_POINTS: u32 = 1;
const CMF_ACCUMULATION: f64 = 0.15;

const LOWER_BAND_PROXIMITY: f64 = 0.014;
const RSI_VOLATILITY_CEILING: f64 = 32.0;
const CMF_VOLUME_FLOOR: f64 = -0.18;

pub trait SignalAggregator {
    fn name(&self) -> &'static str;
    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalScore;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregatorKind {
    #[default]
    Hierarchical,
    Confluence,
    Volatility,
}

impl AggregatorKind {
    pub fn build(&self, take_profit_atr_multiple: f64) -> Box<dyn SignalAggregator> {
        match self {
            AggregatorKind::Hierarchical => Box::new(HierarchicalAggregator {
                take_profit_atr_multiple,
            }),
            AggregatorKind::Confluence => Box::new(ConfluenceAggregator),
            AggregatorKind::Volatility => Box::new(VolatilityAggregator),
        }
    }
}

impl FromStr for AggregatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hierarchical" => Ok(AggregatorKind::Hierarchical),
            "confluence" => Ok(AggregatorKind::Confluence),
            "volatility" => Ok(AggregatorKind::Volatility),
            other => Err(format!(
                "unknown strategy '{}', expected hierarchical, confluence or volatility",
                other
            )),
        }
    }
}

impl fmt::Display for AggregatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorKind::Hierarchical => write!(f, "hierarchical"),
            AggregatorKind::Confluence => write!(f, "confluence"),
            AggregatorKind::Volatility => write!(f, "volatility"),
        }
    }
}

/// Recommendation tier for a hierarchical score.
pub fn tier(score: u32) -> (Recommendation, Option<Strength>) {
    match score {
        s if s >= 7 => (Recommendation::Buy, Some(Strength::Institutional)),
        5 | 6 => (Recommendation::Buy, Some(Strength::Strong)),
        4 => (Recommendation::Buy, Some(Strength::Moderate)),
        2 | 3 => (Recommendation::Watch, Some(Strength::Weak)),
        _ => (Recommendation::None, None),
    }
}

#[derive(Debug, Clone)]
pub struct HierarchicalAggregator {
    pub take_profit_atr_multiple: f64,
}

impl Default for HierarchicalAggregator {
    fn default() -> Self {
        Self {
            take_profit_atr_multiple: DEFAULT_TAKE_PROFIT_ATR_MULTIPLE,
        }
    }
}

impl SignalAggregator for HierarchicalAggregator {
    fn name(&self) -> &'static str {
        "hierarchical"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalScore {
        if !snapshot.macro_regime.bullish {
            return SignalScore::none("Bearish Macro Regime");
        }

        let mut score = 0;
        let mut reasons = vec!["Bullish Macro Regime".to_string()];
        let mut signals = Vec::new();

        // Layer 2: structure
        if snapshot.structure.as_ref().is_some_and(|s| s.is_higher_low()) {
            score += STRUCTURE_POINTS;
            reasons.push("Higher Low structure".into());
            signals.push("STRUCTURE".into());
        }

        // Layer 3: triggers
        if snapshot.divergence.as_ref().is_some_and(|d| d.bullish) {
            score += DIVERGENCE_POINTS;
            reasons.push("Bullish RSI divergence".into());
            signals.push("RSI-DIV".into());
        }
        if snapshot
            .squeeze
            .as_ref()
            .is_some_and(|s| s.is_squeeze_expanding())
        {
            score += SQUEEZE_POINTS;
            reasons.push("Bollinger squeeze expanding".into());
            signals.push("BB-SQUEEZE".into());
        }
        if let Some(cmf) = snapshot.cmf.as_ref().filter(|c| c.cmf > CMF_ACCUMULATION) {
            score += CMF_POINTS;
            reasons.push(format!("Institutional accumulation: CMF={:.2}", cmf.cmf));
            signals.push("CMF".into());
        }
        if snapshot
            .macd
            .as_ref()
            .is_some_and(|m| m.crossover == Crossover::BullishCrossover)
        {
            score += MACD_POINTS;
            reasons.push("MACD bullish crossover".into());
            signals.push("MACD".into());
        }

        let (recommendation, strength) = tier(score);
        let (entry_price, take_profit, stop_loss) = if recommendation == Recommendation::Buy {
            let entry = snapshot.price;
            (
                Some(entry),
                snapshot
                    .atr
                    .as_ref()
                    .map(|a| entry + self.take_profit_atr_multiple * a.atr),
                snapshot.structure.as_ref().and_then(|s| s.stop_level()),
            )
        } else {
            (None, None, None)
        };

        SignalScore {
            recommendation,
            score,
            strength,
            reasons,
            signals,
            entry_price,
            take_profit,
            stop_loss,
        }
    }
}

fn near_lower_band(snapshot: &IndicatorSnapshot) -> bool {
    snapshot
        .bollinger
        .as_ref()
        .is_some_and(|b| b.distance_from_lower() <= LOWER_BAND_PROXIMITY)
}

/// Four independent confluence checks; BUY on two or more.
#[derive(Debug, Clone, Default)]
pub struct ConfluenceAggregator;

impl SignalAggregator for ConfluenceAggregator {
    fn name(&self) -> &'static str {
        "confluence"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalScore {
        let positive_cmf = snapshot.cmf.as_ref().is_some_and(|c| c.cmf >= 0.0);
        let positive_rsi = snapshot.rsi.as_ref().is_some_and(|r| r.is_favorable());
        let supported = positive_cmf || positive_rsi;

        let mut signals: Vec<String> = Vec::new();
        if let Some(macd) = &snapshot.macd {
            if macd.macd >= macd.signal && macd.is_potential_entry && positive_cmf {
                signals.push("MACD-1 & CMF".into());
            }
            if macd.histogram >= 0.0 && macd.trend_strength.is_bullish() {
                signals.push("MACD-2".into());
            }
        }
        if near_lower_band(snapshot) && supported {
            signals.push("BB-1 & (CMF,RSI)".into());
        }
        if snapshot
            .bollinger
            .as_ref()
            .is_some_and(|b| b.crossed_above_middle)
            && supported
        {
            signals.push("BB-2 & RSI".into());
        }

        let score = signals.len() as u32;
        let (recommendation, strength) = match score {
            s if s > 2 => (Recommendation::Buy, Some(Strength::Strong)),
            2 => (Recommendation::Buy, Some(Strength::Weak)),
            _ => (Recommendation::None, Some(Strength::Weak)),
        };

        SignalScore {
            recommendation,
            score,
            strength,
            reasons: Vec::new(),
            signals,
            entry_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }
}

/// Volatility, then volume, then trend; each stage only runs if the
/// previous one passed.
#[derive(Debug, Clone, Default)]
pub struct VolatilityAggregator;

impl SignalAggregator for VolatilityAggregator {
    fn name(&self) -> &'static str {
        "volatility"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalScore {
        let mut reasons = Vec::new();
        let mut score = 0;
        let mut recommendation = Recommendation::None;
        let mut strength = Strength::Weak;

        let low_rsi = snapshot
            .rsi
            .as_ref()
            .is_some_and(|r| r.rsi <= RSI_VOLATILITY_CEILING);
        if near_lower_band(snapshot) || low_rsi {
            score += 1;
            reasons.push("Price volatility is favorable".to_string());

            if snapshot.cmf.as_ref().is_some_and(|c| c.cmf > CMF_VOLUME_FLOOR) {
                score += 1;
                reasons.push("Volume confirmation is positive".to_string());
                recommendation = Recommendation::Buy;

                let trending = snapshot
                    .macd
                    .as_ref()
                    .is_some_and(|m| m.macd >= m.signal || m.histogram >= 0.0);
                if trending {
                    score += 1;
                    reasons.push("Trend confirmation is positive".to_string());
                    strength = Strength::Strong;
                } else {
                    reasons.push("Trend confirmation is negative".to_string());
                }
            } else {
                reasons.push("Volume confirmation is negative".to_string());
            }
        } else {
            reasons.push("Price volatility is not favorable".to_string());
        }

        SignalScore {
            recommendation,
            score,
            strength: Some(strength),
            reasons,
            signals: Vec::new(),
            entry_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }
}
