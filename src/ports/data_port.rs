//! Market data access port.

use crate::domain::bar_series::{BarSeries, Timeframe};
use crate::domain::error::StockflowError;

pub trait DataPort {
    /// Full history for `symbol` at `timeframe`, oldest first.
    fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, StockflowError>;

    fn list_symbols(&self) -> Result<Vec<String>, StockflowError>;
}
