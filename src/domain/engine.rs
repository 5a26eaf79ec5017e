//! Indicator snapshot plus aggregator, evaluated on look-ahead-free prefixes.

use chrono::NaiveDateTime;

use crate::domain::aggregator::{AggregatorKind, SignalAggregator};
use crate::domain::bar_series::BarSeries;
use crate::domain::error::{IndicatorError, StockflowError};
use crate::domain::indicator::{IndicatorParams, IndicatorSnapshot};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalReport, SignalScore};

pub struct SignalEngine {
    params: IndicatorParams,
    aggregator: Box<dyn SignalAggregator>,
}

impl SignalEngine {
    pub fn new(params: IndicatorParams, kind: AggregatorKind, take_profit_atr_multiple: f64) -> Self {
        Self {
            params,
            aggregator: kind.build(take_profit_atr_multiple),
        }
    }

    /// Engine with a caller-supplied aggregator.
    pub fn with_aggregator(params: IndicatorParams, aggregator: Box<dyn SignalAggregator>) -> Self {
        Self { params, aggregator }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn aggregator_name(&self) -> &'static str {
        self.aggregator.name()
    }

    /// Score pre-sliced prefixes.
    pub fn evaluate(
        &self,
        daily: &[OhlcvBar],
        hourly: &[OhlcvBar],
    ) -> Result<(IndicatorSnapshot, SignalScore), IndicatorError> {
        let snapshot = IndicatorSnapshot::compute(daily, hourly, &self.params)?;
        let score = self.aggregator.evaluate(&snapshot);
        Ok((snapshot, score))
    }

    /// Score as of hourly bar `ts`: hourly bars up to and including `ts`,
    /// daily bars from earlier calendar days only.
    pub fn evaluate_at(
        &self,
        daily: &BarSeries,
        hourly: &BarSeries,
        ts: NaiveDateTime,
    ) -> Result<(IndicatorSnapshot, SignalScore), IndicatorError> {
        self.evaluate(
            daily.prefix_before_date(ts.date()),
            hourly.prefix_through(ts),
        )
    }

    /// Report for the latest hourly bar.
    pub fn latest_report(
        &self,
        daily: &BarSeries,
        hourly: &BarSeries,
    ) -> Result<SignalReport, StockflowError> {
        let last = hourly.last().ok_or(IndicatorError::EmptySeries)?;
        let (snapshot, score) = self.evaluate_at(daily, hourly, last.timestamp)?;
        Ok(score.to_report(hourly.symbol(), &snapshot, last.timestamp))
    }
}
