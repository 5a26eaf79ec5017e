//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::Backtester;
use crate::domain::bar_series::{BarSeries, Timeframe};
use crate::domain::engine::SignalEngine;
use crate::domain::error::StockflowError;
use crate::domain::settings::{Settings, parse_symbols};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockflow", about = "Equity signal engine and backtester")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the latest hourly bar of one symbol
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
    },
    /// Backtest one symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Also write the trade log as CSV
        #[arg(long)]
        trades_csv: Option<PathBuf>,
    },
    /// Backtest many symbols and summarise
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding the config and data directory
        #[arg(long)]
        symbols: Option<String>,
        /// Write the scan JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols with bar files in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Signal { config, symbol } => run_signal(&config, &symbol),
        Command::Backtest {
            config,
            symbol,
            trades_csv,
        } => run_backtest(&config, &symbol, trades_csv.as_deref()),
        Command::Scan {
            config,
            symbols,
            output,
        } => run_scan(&config, symbols.as_deref(), output.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(err: &StockflowError) -> ExitCode {
    error!(error = %err, "command failed");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn load_settings(path: &Path) -> Result<Settings, ExitCode> {
    let adapter = load_config(path)?;
    Settings::from_config(&adapter).map_err(|e| fail(&e))
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&StockflowError::from(e)),
    }
}

/// Symbols for a scan: explicit override, then config, then every symbol
/// with bar files.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    settings: &Settings,
    data: &dyn DataPort,
) -> Result<Vec<String>, StockflowError> {
    if let Some(list) = symbols_override {
        return Ok(parse_symbols(list));
    }
    if !settings.symbols.is_empty() {
        return Ok(settings.symbols.clone());
    }
    data.list_symbols()
}

fn run_signal(config_path: &Path, symbol: &str) -> ExitCode {
    // Stage 1: Load and validate config
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let symbol = symbol.trim().to_uppercase();

    // Stage 2: Fetch bars
    let data = CsvAdapter::new(settings.data_dir.clone());
    let (daily, hourly) = match fetch_pair(&data, &symbol) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };

    // Stage 3: Score the latest bar
    let engine = SignalEngine::new(
        settings.backtest.indicators.clone(),
        settings.backtest.aggregator,
        settings.backtest.take_profit_atr_multiple,
    );
    info!(symbol = %symbol, aggregator = engine.aggregator_name(), "evaluating signal");
    match engine.latest_report(&daily, &hourly) {
        Ok(report) => print_json(&report),
        Err(e) => fail(&e),
    }
}

fn fetch_pair(data: &dyn DataPort, symbol: &str) -> Result<(BarSeries, BarSeries), StockflowError> {
    let daily = data.fetch_bars(symbol, Timeframe::Daily)?;
    let hourly = data.fetch_bars(symbol, Timeframe::Hourly)?;
    Ok((daily, hourly))
}

fn run_backtest(config_path: &Path, symbol: &str, trades_csv: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let symbol = symbol.trim().to_uppercase();

    // Stage 2: Fetch bars
    let data = CsvAdapter::new(settings.data_dir.clone());
    let (daily, hourly) = match fetch_pair(&data, &symbol) {
        Ok(pair) => pair,
        Err(e) => return fail(&e),
    };

    // Stage 3: Walk the hourly series
    let backtester = Backtester::new(settings.backtest);
    info!(symbol = %symbol, bars = hourly.len(), "running backtest");
    let result = match backtester.run_symbol(&daily, &hourly) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 4: Optional trade log
    if let Some(path) = trades_csv {
        if let Err(e) = JsonReportAdapter::new().write_trades(&result.trades, path) {
            return fail(&e);
        }
    }

    print_json(&result)
}

fn run_scan(config_path: &Path, symbols_override: Option<&str>, output: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Stage 2: Resolve the universe
    let data = CsvAdapter::new(settings.data_dir.clone());
    let symbols = match resolve_symbols(symbols_override, &settings, &data) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if symbols.is_empty() {
        return fail(&StockflowError::ConfigMissing {
            section: "data".into(),
            key: "symbols".into(),
        });
    }
    info!(count = symbols.len(), "scanning symbols");

    // Stage 3: Backtest each symbol
    let backtester = Backtester::new(settings.backtest);
    let scan = backtester.run_scan(&data, &symbols);

    // Stage 4: Report
    match output {
        Some(path) => match JsonReportAdapter::new().write_scan(&scan, path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        },
        None => print_json(&scan),
    }
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let data = CsvAdapter::new(settings.data_dir);
    let symbols = match data.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        info!("no symbols found");
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    ExitCode::SUCCESS
}
