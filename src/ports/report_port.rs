//! Report output port.

use std::path::Path;

use crate::domain::backtest::ScanResult;
use crate::domain::error::StockflowError;
use crate::domain::trade::TradeResult;

pub trait ReportPort {
    fn write_scan(&self, result: &ScanResult, output_path: &Path) -> Result<(), StockflowError>;

    fn write_trades(&self, trades: &[TradeResult], output_path: &Path)
    -> Result<(), StockflowError>;
}
