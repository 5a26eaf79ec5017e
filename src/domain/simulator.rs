//! Trade lifecycle simulation.
//!
//! One position per symbol. `execute_buy` opens it; `update` walks it bar by
//! bar: raise the high-water mark, arm the trailing stop once price has run
//! `activation_atr_multiple` ATRs, ratchet the stop, then exit on a stop
//! breach (at the stop price) or on expiry (at the close).
//!
//! pnl_percent = ((exit - entry) / entry - 2 × slippage) × 100

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::domain::metrics::TradeSummary;
use crate::domain::trade::{ExitReason, Trade, TradeResult};

pub const DEFAULT_SLIPPAGE: f64 = 0.0005;
pub const DEFAULT_MAX_HOLD_DAYS: i64 = 5;
pub const DEFAULT_TRAIL_ATR_MULTIPLE: f64 = 1.5;
pub const DEFAULT_ACTIVATION_ATR_MULTIPLE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Per-side slippage as a fraction of price.
    pub slippage: f64,
    pub max_hold: Duration,
    pub trail_atr_multiple: f64,
    pub activation_atr_multiple: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            slippage: DEFAULT_SLIPPAGE,
            max_hold: Duration::days(DEFAULT_MAX_HOLD_DAYS),
            trail_atr_multiple: DEFAULT_TRAIL_ATR_MULTIPLE,
            activation_atr_multiple: DEFAULT_ACTIVATION_ATR_MULTIPLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeSimulator {
    symbol: String,
    config: SimulatorConfig,
    active: Option<Trade>,
    trades: Vec<TradeResult>,
}

impl TradeSimulator {
    pub fn new(symbol: impl Into<String>, config: SimulatorConfig) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            active: None,
            trades: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_trade(&self) -> Option<&Trade> {
        self.active.as_ref()
    }

    pub fn trades(&self) -> &[TradeResult] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeResult> {
        self.trades
    }

    /// Open a position. Returns false, changing nothing, if one is open.
    pub fn execute_buy(
        &mut self,
        price: f64,
        take_profit: f64,
        stop_loss: f64,
        time: NaiveDateTime,
        atr: f64,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }

        debug!(
            symbol = %self.symbol,
            %time,
            price,
            stop_loss,
            take_profit,
            atr,
            "entry"
        );
        self.active = Some(Trade {
            symbol: self.symbol.clone(),
            entry_price: price,
            entry_time: time,
            initial_take_profit: take_profit,
            stop_loss,
            atr,
            highest_high: price,
            trailing_active: false,
            max_age: time + self.config.max_hold,
        });
        true
    }

    /// Advance the open position by one bar; returns the result if it closed.
    pub fn update(
        &mut self,
        time: NaiveDateTime,
        high: f64,
        low: f64,
        close: f64,
    ) -> Option<TradeResult> {
        let trade = self.active.as_mut()?;

        trade.highest_high = trade.highest_high.max(high);

        let activation = trade.entry_price + self.config.activation_atr_multiple * trade.atr;
        if !trade.trailing_active && trade.highest_high >= activation {
            trade.trailing_active = true;
        }
        if trade.trailing_active {
            let trail = trade.highest_high - self.config.trail_atr_multiple * trade.atr;
            trade.stop_loss = trade.stop_loss.max(trail);
        }

        let (exit_price, exit_reason) = if trade.should_stop_out(low) {
            let reason = if trade.trailing_active {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            (trade.stop_loss, reason)
        } else if trade.is_expired(time) {
            (close, ExitReason::Timeout)
        } else {
            return None;
        };

        let trade = self.active.take()?;
        let result = TradeResult {
            pnl_percent: pnl_percent(trade.entry_price, exit_price, self.config.slippage),
            symbol: trade.symbol,
            entry_time: trade.entry_time,
            exit_time: time,
            entry_price: trade.entry_price,
            exit_price,
            exit_reason,
        };
        debug!(
            symbol = %result.symbol,
            %time,
            exit_price,
            pnl = result.pnl_percent,
            reason = %exit_reason,
            "exit"
        );
        self.trades.push(result.clone());
        Some(result)
    }

    pub fn get_summary(&self) -> TradeSummary {
        TradeSummary::compute(&self.trades)
    }
}

/// Round-trip return in percent, net of slippage on both sides.
pub fn pnl_percent(entry: f64, exit: f64, slippage: f64) -> f64 {
    ((exit - entry) / entry - 2.0 * slippage) * 100.0
}
