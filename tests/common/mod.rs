#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use stockflow::domain::aggregator::SignalAggregator;
use stockflow::domain::bar_series::{BarSeries, Timeframe};
use stockflow::domain::error::StockflowError;
use stockflow::domain::indicator::IndicatorSnapshot;
pub use stockflow::domain::ohlcv::OhlcvBar;
use stockflow::domain::signal::{Recommendation, SignalScore, Strength};
use stockflow::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<(String, Timeframe), Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, timeframe: Timeframe, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert((symbol.to_string(), timeframe), bars);
        self
    }

    /// Both timeframes at once.
    pub fn with_symbol(self, symbol: &str, daily: Vec<OhlcvBar>, hourly: Vec<OhlcvBar>) -> Self {
        self.with_bars(symbol, Timeframe::Daily, daily)
            .with_bars(symbol, Timeframe::Hourly, hourly)
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, StockflowError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StockflowError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| StockflowError::DataSource {
                reason: format!("no {} bars for {}", timeframe, symbol),
            })?;
        BarSeries::new(symbol, timeframe, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockflowError> {
        let mut symbols: Vec<String> = self.data.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

/// Buys every bar it sees with fixed offsets around the close.
pub struct FixedBuy {
    pub stop_offset: f64,
    pub target_offset: f64,
}

impl FixedBuy {
    pub fn boxed(stop_offset: f64, target_offset: f64) -> Box<dyn SignalAggregator> {
        Box::new(Self {
            stop_offset,
            target_offset,
        })
    }
}

impl SignalAggregator for FixedBuy {
    fn name(&self) -> &'static str {
        "fixed-buy"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalScore {
        SignalScore {
            recommendation: Recommendation::Buy,
            score: 9,
            strength: Some(Strength::Institutional),
            reasons: vec!["fixed".into()],
            signals: Vec::new(),
            entry_price: Some(snapshot.price),
            take_profit: Some(snapshot.price + self.target_offset),
            stop_loss: Some(snapshot.price - self.stop_offset),
        }
    }
}

pub fn day(i: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(i)
}

/// Bar with a one-point range around `close`.
pub fn make_bar(timestamp: NaiveDateTime, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 10_000.0,
    }
}

/// `days` daily bars rising (or falling) by `slope` per day.
pub fn trending_daily(days: i64, slope: f64) -> Vec<OhlcvBar> {
    (0..days)
        .map(|i| make_bar(day(i), 100.0 + i as f64 * slope))
        .collect()
}

/// Consecutive hourly bars starting at 09:00 on `start_day`.
pub fn hourly_from_closes(start_day: i64, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = day(start_day) + Duration::hours(9);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Duration::hours(i as i64), c))
        .collect()
}

pub fn oscillating_hourly(start_day: i64, n: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 200.0 + (i as f64 * 0.35).sin() * 5.0 + i as f64 * 0.02)
        .collect();
    hourly_from_closes(start_day, &closes)
}

/// Write bars in the on-disk CSV layout.
pub fn write_bar_csv(dir: &Path, symbol: &str, timeframe: Timeframe, bars: &[OhlcvBar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        writeln!(
            content,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
    fs::write(dir.join(format!("{}_{}.csv", symbol, timeframe)), content).unwrap();
}
