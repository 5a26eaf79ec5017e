//! JSON/CSV report adapter implementing ReportPort.
//!
//! Scan results are written as pretty-printed JSON; trade logs as CSV with
//! one row per closed trade.

use std::fs;
use std::path::Path;

use crate::domain::backtest::ScanResult;
use crate::domain::error::StockflowError;
use crate::domain::trade::TradeResult;
use crate::ports::report_port::ReportPort;

const TRADE_COLUMNS: [&str; 7] = [
    "symbol",
    "entry_time",
    "exit_time",
    "entry_price",
    "exit_price",
    "pnl_percent",
    "exit_reason",
];

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_parent(output_path: &Path) -> Result<(), StockflowError> {
    match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| StockflowError::Report {
                reason: format!("failed to create {}: {}", dir.display(), e),
            })
        }
        _ => Ok(()),
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_scan(&self, result: &ScanResult, output_path: &Path) -> Result<(), StockflowError> {
        ensure_parent(output_path)?;
        let json = serde_json::to_string_pretty(result)?;
        fs::write(output_path, json).map_err(|e| StockflowError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })?;
        tracing::info!(path = %output_path.display(), "scan report written");
        Ok(())
    }

    fn write_trades(
        &self,
        trades: &[TradeResult],
        output_path: &Path,
    ) -> Result<(), StockflowError> {
        ensure_parent(output_path)?;
        let report_err = |e: csv::Error| StockflowError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        };

        // Header written by hand so an empty log still has one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(output_path)
            .map_err(report_err)?;
        writer.write_record(TRADE_COLUMNS).map_err(report_err)?;
        for trade in trades {
            writer.serialize(trade).map_err(report_err)?;
        }
        writer.flush()?;
        tracing::info!(
            path = %output_path.display(),
            trades = trades.len(),
            "trade log written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::SymbolResult;
    use crate::domain::trade::ExitReason;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn make_trade(symbol: &str, pnl: f64, reason: ExitReason) -> TradeResult {
        let entry = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        TradeResult {
            symbol: symbol.into(),
            entry_time: entry,
            exit_time: entry + chrono::Duration::hours(4),
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            pnl_percent: pnl,
            exit_reason: reason,
        }
    }

    fn sample_scan() -> ScanResult {
        let results = vec![
            SymbolResult::completed(
                "TCS.NS",
                vec![
                    make_trade("TCS.NS", 2.5, ExitReason::TrailingStop),
                    make_trade("TCS.NS", -1.0, ExitReason::StopLoss),
                ],
            ),
            SymbolResult::failed("BROKEN.NS", "data source error: no file"),
        ];
        ScanResult::from_symbol_results(results)
    }

    #[test]
    fn writes_scan_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("scan.json");

        JsonReportAdapter::new()
            .write_scan(&sample_scan(), &path)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["symbols_scanned"], 2);
        assert_eq!(json["summary"]["symbols_failed"], 1);
        assert_eq!(json["summary"]["total_trades"], 2);
        assert_eq!(json["failed"][0]["symbol"], "BROKEN.NS");
        assert_eq!(json["trades"][0]["exit_reason"], "TRAILING_STOP");
    }

    #[test]
    fn writes_trade_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        let trades = vec![
            make_trade("INFY.NS", 1.5, ExitReason::Timeout),
            make_trade("INFY.NS", -0.8, ExitReason::StopLoss),
        ];

        JsonReportAdapter::new().write_trades(&trades, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,entry_time,exit_time,entry_price,exit_price,pnl_percent,exit_reason"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("INFY.NS,2024-02-01T10:15:00,2024-02-01T14:15:00"));
        assert!(first.ends_with("TIMEOUT"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn empty_trade_log_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");

        JsonReportAdapter::new().write_trades(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), TRADE_COLUMNS.join(","));
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let path = blocker.join("scan.json");

        let err = JsonReportAdapter::new()
            .write_scan(&sample_scan(), &path)
            .unwrap_err();
        assert!(matches!(err, StockflowError::Report { .. }));
    }
}
