//! Scored recommendations and their serialisable report form.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::indicator::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    None,
    Watch,
    Buy,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::None => write!(f, "NONE"),
            Recommendation::Watch => write!(f, "WATCH"),
            Recommendation::Buy => write!(f, "BUY"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
    Institutional,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Weak => "Weak",
            Strength::Moderate => "Moderate",
            Strength::Strong => "Strong",
            Strength::Institutional => "Institutional",
        };
        f.write_str(label)
    }
}

/// Result of one aggregator evaluation.
///
/// Prices are only set on BUY. A BUY without `stop_loss` must not be acted on.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalScore {
    pub recommendation: Recommendation,
    pub score: u32,
    pub strength: Option<Strength>,
    pub reasons: Vec<String>,
    pub signals: Vec<String>,
    pub entry_price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl SignalScore {
    /// Score 0, NONE, with a single reason.
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            recommendation: Recommendation::None,
            score: 0,
            strength: None,
            reasons: vec![reason.into()],
            signals: Vec::new(),
            entry_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.recommendation == Recommendation::Buy
    }

    /// Flatten into the report record returned to callers.
    pub fn to_report(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        timestamp: NaiveDateTime,
    ) -> SignalReport {
        let mut metadata = BTreeMap::new();
        metadata.insert("price".to_string(), finite(snapshot.price));
        metadata.insert(
            "macro_ema_fast".to_string(),
            finite(snapshot.macro_regime.ema_fast),
        );
        metadata.insert(
            "macro_ema_slow".to_string(),
            finite(snapshot.macro_regime.ema_slow),
        );
        for result in snapshot.results() {
            for (name, value) in result.values() {
                metadata.insert(name.to_string(), finite(value));
            }
        }

        SignalReport {
            symbol: symbol.to_string(),
            recommendation: self.recommendation,
            buy: self.is_buy(),
            score: self.score,
            strength: self.strength,
            reason: self.reasons.join("; "),
            signals: self.signals.join("; "),
            entry_price: self.entry_price.and_then(finite),
            take_profit: self.take_profit.and_then(finite),
            stop_loss: self.stop_loss.and_then(finite),
            metadata,
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub symbol: String,
    pub recommendation: Recommendation,
    pub buy: bool,
    pub score: u32,
    pub strength: Option<Strength>,
    pub reason: String,
    pub signals: String,
    pub entry_price: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub metadata: BTreeMap<String, Option<f64>>,
    pub timestamp: String,
}
