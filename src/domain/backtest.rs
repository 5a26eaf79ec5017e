//! Bar-by-bar backtest driver.
//!
//! For each hourly bar from `lookback_bars` on: an open trade is updated;
//! otherwise the engine scores the prefixes ending at that bar and a
//! qualifying BUY opens a trade. Bulk scans isolate failures per symbol.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::aggregator::{AggregatorKind, DEFAULT_TAKE_PROFIT_ATR_MULTIPLE, SignalAggregator};
use crate::domain::bar_series::{BarSeries, Timeframe};
use crate::domain::engine::SignalEngine;
use crate::domain::error::StockflowError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::metrics::{PortfolioSummary, SymbolResult};
use crate::domain::simulator::{SimulatorConfig, TradeSimulator};
use crate::domain::trade::TradeResult;
use crate::ports::data_port::DataPort;

pub const DEFAULT_LOOKBACK_BARS: usize = 50;
pub const DEFAULT_MIN_ENTRY_SCORE: u32 = 6;

const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub lookback_bars: usize,
    pub min_entry_score: u32,
    pub take_profit_atr_multiple: f64,
    pub aggregator: AggregatorKind,
    pub indicators: IndicatorParams,
    pub simulator: SimulatorConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            lookback_bars: DEFAULT_LOOKBACK_BARS,
            min_entry_score: DEFAULT_MIN_ENTRY_SCORE,
            take_profit_atr_multiple: DEFAULT_TAKE_PROFIT_ATR_MULTIPLE,
            aggregator: AggregatorKind::default(),
            indicators: IndicatorParams::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub results: Vec<SymbolResult>,
    pub failed: Vec<FailedSymbol>,
    pub trades: Vec<TradeResult>,
    pub summary: PortfolioSummary,
}

impl ScanResult {
    pub fn from_symbol_results(results: Vec<SymbolResult>) -> Self {
        let failed = results
            .iter()
            .filter_map(|r| {
                r.error.as_ref().map(|reason| FailedSymbol {
                    symbol: r.symbol.clone(),
                    reason: reason.clone(),
                })
            })
            .collect();
        let trades = results.iter().flat_map(|r| r.trades.iter().cloned()).collect();
        let summary = PortfolioSummary::compute(&results);
        Self {
            results,
            failed,
            trades,
            summary,
        }
    }
}

pub struct Backtester {
    config: BacktestConfig,
    engine: SignalEngine,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        let engine = SignalEngine::new(
            config.indicators.clone(),
            config.aggregator,
            config.take_profit_atr_multiple,
        );
        Self { config, engine }
    }

    /// Backtester driven by a custom aggregator instead of `config.aggregator`.
    pub fn with_aggregator(config: BacktestConfig, aggregator: Box<dyn SignalAggregator>) -> Self {
        let engine = SignalEngine::with_aggregator(config.indicators.clone(), aggregator);
        Self { config, engine }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// Walk one symbol's hourly series. Trades still open at the end are
    /// not reported.
    pub fn run_symbol(
        &self,
        daily: &BarSeries,
        hourly: &BarSeries,
    ) -> Result<SymbolResult, StockflowError> {
        if daily.symbol() != hourly.symbol() {
            return Err(StockflowError::InvalidBars {
                symbol: hourly.symbol().to_string(),
                reason: format!("daily series is for {}", daily.symbol()),
            });
        }

        let mut simulator = TradeSimulator::new(hourly.symbol(), self.config.simulator.clone());

        for bar in hourly.bars().iter().skip(self.config.lookback_bars) {
            if simulator.is_active() {
                simulator.update(bar.timestamp, bar.high, bar.low, bar.close);
                continue;
            }

            let (snapshot, score) = match self.engine.evaluate_at(daily, hourly, bar.timestamp) {
                Ok(evaluation) => evaluation,
                Err(e) if e.is_insufficient() => continue,
                Err(e) => return Err(e.into()),
            };

            if !score.is_buy() || score.score < self.config.min_entry_score {
                continue;
            }
            let (Some(entry), Some(take_profit), Some(stop_loss), Some(atr)) = (
                score.entry_price,
                score.take_profit,
                score.stop_loss,
                snapshot.atr.as_ref(),
            ) else {
                debug!(symbol = hourly.symbol(), time = %bar.timestamp, "buy without prices, skipped");
                continue;
            };
            if stop_loss >= entry {
                debug!(symbol = hourly.symbol(), time = %bar.timestamp, stop_loss, entry, "stop above entry, skipped");
                continue;
            }

            simulator.execute_buy(entry, take_profit, stop_loss, bar.timestamp, atr.atr);
        }

        if let (Some(trade), Some(last)) = (simulator.active_trade(), hourly.bars().last()) {
            debug!(
                symbol = hourly.symbol(),
                entry_time = %trade.entry_time,
                unrealized_pnl = trade.unrealized_pnl_percent(last.close),
                "trade still open at end of data, not reported"
            );
        }

        Ok(SymbolResult::completed(
            hourly.symbol(),
            simulator.into_trades(),
        ))
    }

    /// Backtest every symbol; failures are logged and recorded, never fatal.
    pub fn run_scan(&self, data: &dyn DataPort, symbols: &[String]) -> ScanResult {
        let mut results = Vec::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            let outcome = data
                .fetch_bars(symbol, Timeframe::Daily)
                .and_then(|daily| {
                    let hourly = data.fetch_bars(symbol, Timeframe::Hourly)?;
                    self.run_symbol(&daily, &hourly)
                });

            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "skipping symbol");
                    results.push(SymbolResult::failed(symbol.clone(), e.to_string()));
                }
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(done = i + 1, total = symbols.len(), "scan progress");
            }
        }

        let scan = ScanResult::from_symbol_results(results);
        info!(
            symbols = scan.summary.symbols_scanned,
            failed = scan.summary.symbols_failed,
            trades = scan.summary.total_trades,
            "scan complete"
        );
        scan
    }
}
