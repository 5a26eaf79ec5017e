//! Open trades and closed trade records.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::signal::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    Timeout,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
            ExitReason::TrailingStop => write!(f, "TRAILING_STOP"),
            ExitReason::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// An open long position managed by the simulator.
///
/// `highest_high` never decreases, and neither does `stop_loss` once
/// `trailing_active` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub initial_take_profit: f64,
    pub stop_loss: f64,
    pub atr: f64,
    pub highest_high: f64,
    pub trailing_active: bool,
    pub max_age: NaiveDateTime,
}

impl Trade {
    /// Unrealized return at `price`, before slippage.
    pub fn unrealized_pnl_percent(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price * 100.0
    }

    pub fn should_stop_out(&self, low: f64) -> bool {
        low <= self.stop_loss
    }

    pub fn is_expired(&self, time: NaiveDateTime) -> bool {
        time >= self.max_age
    }
}

pub(crate) fn serialize_timestamp<S: Serializer>(
    ts: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeResult {
    pub symbol: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub entry_time: NaiveDateTime,
    #[serde(serialize_with = "serialize_timestamp")]
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Net of round-trip slippage.
    pub pnl_percent: f64,
    pub exit_reason: ExitReason,
}

impl TradeResult {
    pub fn is_win(&self) -> bool {
        self.pnl_percent > 0.0
    }

    pub fn holding_hours(&self) -> i64 {
        (self.exit_time - self.entry_time).num_hours()
    }
}
