//! Trade log statistics.
//!
//! Win rate is the percentage of trades with pnl_percent > 0. Profit factor
//! is Σ wins / |Σ losses|: infinite when there are wins but no losses, 0 when
//! there are neither. Infinite values serialise as null.

use serde::{Serialize, Serializer};

use crate::domain::trade::{ExitReason, TradeResult};

fn serialize_ratio<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct TradeStats {
    total: usize,
    wins: usize,
    losses: usize,
    gross_win: f64,
    gross_loss: f64,
    total_pnl: f64,
    best: f64,
    worst: f64,
}

impl TradeStats {
    fn collect<'a>(trades: impl IntoIterator<Item = &'a TradeResult>) -> Self {
        let mut stats = TradeStats::default();
        for trade in trades {
            let pnl = trade.pnl_percent;
            if stats.total == 0 {
                stats.best = pnl;
                stats.worst = pnl;
            } else {
                stats.best = stats.best.max(pnl);
                stats.worst = stats.worst.min(pnl);
            }
            stats.total += 1;
            stats.total_pnl += pnl;
            if pnl > 0.0 {
                stats.wins += 1;
                stats.gross_win += pnl;
            } else if pnl < 0.0 {
                stats.losses += 1;
                stats.gross_loss += pnl.abs();
            }
        }
        stats
    }

    fn win_rate(&self) -> f64 {
        if self.total > 0 {
            self.wins as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }

    fn profit_factor(&self) -> f64 {
        if self.gross_loss > 0.0 {
            self.gross_win / self.gross_loss
        } else if self.gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn avg_pnl(&self) -> f64 {
        if self.total > 0 {
            self.total_pnl / self.total as f64
        } else {
            0.0
        }
    }
}

/// Statistics over one trade log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl_percent: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub profit_factor: f64,
    pub avg_pnl_percent: f64,
    pub best_trade_percent: f64,
    pub worst_trade_percent: f64,
    pub stop_loss_exits: usize,
    pub trailing_stop_exits: usize,
    pub timeout_exits: usize,
}

impl TradeSummary {
    pub fn compute(trades: &[TradeResult]) -> Self {
        let stats = TradeStats::collect(trades);
        let exits = |reason: ExitReason| trades.iter().filter(|t| t.exit_reason == reason).count();

        TradeSummary {
            total_trades: stats.total,
            winning_trades: stats.wins,
            losing_trades: stats.losses,
            win_rate: stats.win_rate(),
            total_pnl_percent: stats.total_pnl,
            profit_factor: stats.profit_factor(),
            avg_pnl_percent: stats.avg_pnl(),
            best_trade_percent: stats.best,
            worst_trade_percent: stats.worst,
            stop_loss_exits: exits(ExitReason::StopLoss),
            trailing_stop_exits: exits(ExitReason::TrailingStop),
            timeout_exits: exits(ExitReason::Timeout),
        }
    }

    /// True for the "no trades" summary.
    pub fn is_empty(&self) -> bool {
        self.total_trades == 0
    }
}

/// Backtest outcome for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolResult {
    pub symbol: String,
    pub trades: Vec<TradeResult>,
    pub summary: TradeSummary,
    /// Set when the symbol could not be backtested.
    pub error: Option<String>,
}

impl SymbolResult {
    pub fn completed(symbol: impl Into<String>, trades: Vec<TradeResult>) -> Self {
        let summary = TradeSummary::compute(&trades);
        Self {
            symbol: symbol.into(),
            trades,
            summary,
            error: None,
        }
    }

    pub fn failed(symbol: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            trades: Vec::new(),
            summary: TradeSummary::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate over a bulk scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub symbols_scanned: usize,
    pub symbols_failed: usize,
    pub total_trades: usize,
    pub trades_per_symbol: f64,
    pub win_rate: f64,
    pub total_pnl_percent: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub profit_factor: f64,
    pub avg_pnl_percent: f64,
}

impl PortfolioSummary {
    pub fn compute(results: &[SymbolResult]) -> Self {
        let stats = TradeStats::collect(results.iter().flat_map(|r| r.trades.iter()));
        let symbols_failed = results.iter().filter(|r| r.is_failed()).count();
        let succeeded = results.len() - symbols_failed;

        PortfolioSummary {
            symbols_scanned: results.len(),
            symbols_failed,
            total_trades: stats.total,
            trades_per_symbol: if succeeded > 0 {
                stats.total as f64 / succeeded as f64
            } else {
                0.0
            },
            win_rate: stats.win_rate(),
            total_pnl_percent: stats.total_pnl,
            profit_factor: stats.profit_factor(),
            avg_pnl_percent: stats.avg_pnl(),
        }
    }
}
