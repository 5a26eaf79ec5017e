//! Validated per-symbol bar series and prefix slicing.
//!
//! A `BarSeries` is immutable once built. The backtest driver only ever reads
//! prefixes of it, which is what keeps every decision free of look-ahead.

use crate::domain::error::StockflowError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Hourly,
}

impl Timeframe {
    /// Interval code used in file names ("1d", "1h").
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1d",
            Timeframe::Hourly => "1h",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interval())
    }
}

#[derive(Debug, Clone)]
pub struct BarSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    /// Build a series, rejecting unordered timestamps and malformed bars.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, StockflowError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_finite() {
                return Err(StockflowError::InvalidBars {
                    symbol,
                    reason: format!("non-finite value at {}", bar.timestamp),
                });
            }
            if bar.high < bar.low {
                return Err(StockflowError::InvalidBars {
                    symbol,
                    reason: format!("high below low at {}", bar.timestamp),
                });
            }
            if bar.volume < 0.0 {
                return Err(StockflowError::InvalidBars {
                    symbol,
                    reason: format!("negative volume at {}", bar.timestamp),
                });
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(StockflowError::InvalidBars {
                    symbol,
                    reason: format!(
                        "timestamps not strictly increasing at {}",
                        bar.timestamp
                    ),
                });
            }
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// Bars with timestamp at or before `ts`.
    pub fn prefix_through(&self, ts: NaiveDateTime) -> &[OhlcvBar] {
        let end = self.bars.partition_point(|b| b.timestamp <= ts);
        &self.bars[..end]
    }

    /// Bars whose calendar date is strictly before `date`.
    pub fn prefix_before_date(&self, date: NaiveDate) -> &[OhlcvBar] {
        let end = self.bars.partition_point(|b| b.timestamp.date() < date);
        &self.bars[..end]
    }
}
