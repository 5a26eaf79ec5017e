//! CSV bar file data adapter.
//!
//! One file per symbol and timeframe: `<base>/<SYMBOL>_1d.csv` and
//! `<base>/<SYMBOL>_1h.csv`. Columns are located by header name.

use crate::domain::bar_series::{BarSeries, Timeframe};
use crate::domain::error::StockflowError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_HEADERS: [&str; 3] = ["timestamp", "datetime", "date"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Header positions for one file.
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn locate(headers: &StringRecord, symbol: &str) -> Result<Self, StockflowError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |column: &str| {
            names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| StockflowError::MissingColumn {
                    symbol: symbol.to_string(),
                    column: column.to_string(),
                })
        };

        let timestamp = TIMESTAMP_HEADERS
            .iter()
            .find_map(|h| names.iter().position(|n| n == h))
            .ok_or_else(|| StockflowError::MissingColumn {
                symbol: symbol.to_string(),
                column: "timestamp".into(),
            })?;

        Ok(Self {
            timestamp,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, timeframe.interval()))
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(
    record: &StringRecord,
    index: usize,
    column: &str,
    line: u64,
) -> Result<f64, StockflowError> {
    let raw = record.get(index).ok_or_else(|| StockflowError::DataSource {
        reason: format!("line {}: missing {} value", line, column),
    })?;
    raw.trim()
        .parse()
        .map_err(|e| StockflowError::DataSource {
            reason: format!("line {}: invalid {} value {:?}: {}", line, column, raw, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, StockflowError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| StockflowError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| StockflowError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let columns = Columns::locate(&headers, symbol)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StockflowError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_ts = record.get(columns.timestamp).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| StockflowError::DataSource {
                reason: format!("line {}: invalid timestamp {:?}", line, raw_ts),
            })?;

            bars.push(OhlcvBar {
                timestamp,
                open: parse_field(&record, columns.open, "open", line)?,
                high: parse_field(&record, columns.high, "high", line)?,
                low: parse_field(&record, columns.low, "low", line)?,
                close: parse_field(&record, columns.close, "close", line)?,
                volume: parse_field(&record, columns.volume, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(symbol, %timeframe, bars = bars.len(), "loaded bars");
        BarSeries::new(symbol, timeframe, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockflowError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockflowError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffixes = [Timeframe::Daily, Timeframe::Hourly].map(|t| format!("_{}.csv", t));
        let mut symbols = BTreeSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| StockflowError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            for suffix in &suffixes {
                if let Some(symbol) = name_str.strip_suffix(suffix.as_str()) {
                    if !symbol.is_empty() {
                        symbols.insert(symbol.to_string());
                    }
                }
            }
        }

        Ok(symbols.into_iter().collect())
    }
}
