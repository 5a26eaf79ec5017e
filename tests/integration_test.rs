//! Integration tests across the signal engine, backtest driver and adapters.
//!
//! Tests cover:
//! - Latest-bar signal reports on real indicator pipelines
//! - Prefix evaluation never reading future bars
//! - Stop-loss, trailing-stop and timeout exits through the backtest driver
//! - Bulk scans isolating failing symbols
//! - CSV data + INI config + JSON/CSV reports on disk

mod common;

use approx::assert_relative_eq;
use common::*;
use stockflow::domain::aggregator::AggregatorKind;
use stockflow::domain::backtest::{BacktestConfig, Backtester};
use stockflow::domain::bar_series::{BarSeries, Timeframe};
use stockflow::domain::engine::SignalEngine;
use stockflow::domain::indicator::IndicatorParams;
use stockflow::domain::signal::Recommendation;
use stockflow::domain::trade::ExitReason;
use stockflow::ports::data_port::DataPort;

fn series(symbol: &str, timeframe: Timeframe, bars: Vec<OhlcvBar>) -> BarSeries {
    BarSeries::new(symbol, timeframe, bars).unwrap()
}

fn engine(kind: AggregatorKind) -> SignalEngine {
    SignalEngine::new(IndicatorParams::default(), kind, 1.5)
}

mod signal_pipeline {
    use super::*;

    #[test]
    fn bearish_macro_short_circuits() {
        let daily = series("SBIN.NS", Timeframe::Daily, trending_daily(260, -0.2));
        let hourly = series("SBIN.NS", Timeframe::Hourly, oscillating_hourly(260, 120));

        let report = engine(AggregatorKind::Hierarchical)
            .latest_report(&daily, &hourly)
            .unwrap();

        assert_eq!(report.symbol, "SBIN.NS");
        assert_eq!(report.recommendation, Recommendation::None);
        assert!(!report.buy);
        assert_eq!(report.score, 0);
        assert_eq!(report.reason, "Bearish Macro Regime");
        assert!(report.entry_price.is_none());
        assert!(report.stop_loss.is_none());
    }

    #[test]
    fn bullish_report_carries_metadata() {
        let daily = series("TCS.NS", Timeframe::Daily, trending_daily(260, 0.5));
        let hourly = series("TCS.NS", Timeframe::Hourly, oscillating_hourly(260, 150));

        let report = engine(AggregatorKind::Hierarchical)
            .latest_report(&daily, &hourly)
            .unwrap();

        assert!(report.reason.starts_with("Bullish Macro Regime"));
        assert_eq!(report.buy, report.recommendation == Recommendation::Buy);
        assert_eq!(
            report.timestamp,
            hourly
                .last()
                .unwrap()
                .timestamp
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string()
        );
        for key in ["price", "macro_ema_fast", "macro_ema_slow", "rsi", "atr", "cmf"] {
            assert!(report.metadata.contains_key(key), "missing {key}");
        }
        let fast = report.metadata["macro_ema_fast"].unwrap();
        let slow = report.metadata["macro_ema_slow"].unwrap();
        assert!(fast > slow);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["recommendation"].is_string());
    }

    #[test]
    fn short_daily_history_is_insufficient() {
        let daily = series("TCS.NS", Timeframe::Daily, trending_daily(120, 0.5));
        let hourly = series("TCS.NS", Timeframe::Hourly, oscillating_hourly(120, 60));

        let err = engine(AggregatorKind::Hierarchical)
            .latest_report(&daily, &hourly)
            .unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn every_aggregator_scores_the_same_snapshot() {
        let daily = series("INFY.NS", Timeframe::Daily, trending_daily(260, 0.5));
        let hourly = series("INFY.NS", Timeframe::Hourly, oscillating_hourly(260, 150));

        for kind in [
            AggregatorKind::Hierarchical,
            AggregatorKind::Confluence,
            AggregatorKind::Volatility,
        ] {
            let engine = engine(kind);
            let report = engine.latest_report(&daily, &hourly).unwrap();
            assert_eq!(report.symbol, "INFY.NS");
            assert_eq!(engine.aggregator_name(), kind.to_string());
        }
    }
}

mod no_look_ahead {
    use super::*;

    #[test]
    fn future_hourly_bars_do_not_change_the_score() {
        let daily = series("ITC.NS", Timeframe::Daily, trending_daily(260, 0.5));
        let all = oscillating_hourly(260, 200);
        let full = series("ITC.NS", Timeframe::Hourly, all.clone());
        let truncated = series("ITC.NS", Timeframe::Hourly, all[..121].to_vec());
        let ts = all[120].timestamp;

        let engine = engine(AggregatorKind::Hierarchical);
        let (snap_full, score_full) = engine.evaluate_at(&daily, &full, ts).unwrap();
        let (snap_cut, score_cut) = engine.evaluate_at(&daily, &truncated, ts).unwrap();

        assert_eq!(score_full, score_cut);
        assert_eq!(snap_full.timestamp, ts);
        assert_relative_eq!(snap_full.price, snap_cut.price);
    }

    #[test]
    fn same_day_daily_bar_is_excluded() {
        // daily history runs past the hourly start, including the current day
        let daily_bars = trending_daily(300, 0.5);
        let hourly_bars = oscillating_hourly(250, 100);
        let ts = hourly_bars[80].timestamp;

        let full_daily = series("ITC.NS", Timeframe::Daily, daily_bars.clone());
        let prior_days: Vec<OhlcvBar> = daily_bars
            .into_iter()
            .filter(|b| b.timestamp.date() < ts.date())
            .collect();
        let cut_daily = series("ITC.NS", Timeframe::Daily, prior_days);
        let hourly = series("ITC.NS", Timeframe::Hourly, hourly_bars);

        let engine = engine(AggregatorKind::Hierarchical);
        let (a, score_a) = engine.evaluate_at(&full_daily, &hourly, ts).unwrap();
        let (b, score_b) = engine.evaluate_at(&cut_daily, &hourly, ts).unwrap();

        assert_eq!(score_a, score_b);
        assert_relative_eq!(a.macro_regime.ema_fast, b.macro_regime.ema_fast);
        assert_relative_eq!(a.macro_regime.close, b.macro_regime.close);
    }
}

mod simulated_exits {
    use super::*;

    fn run(closes: &[f64]) -> stockflow::domain::metrics::SymbolResult {
        let daily = series("HDFCBANK.NS", Timeframe::Daily, trending_daily(210, 0.5));
        let hourly = series(
            "HDFCBANK.NS",
            Timeframe::Hourly,
            hourly_from_closes(210, closes),
        );
        Backtester::with_aggregator(BacktestConfig::default(), FixedBuy::boxed(1.0, 3.0))
            .run_symbol(&daily, &hourly)
            .unwrap()
    }

    #[test]
    fn stop_loss_exit_at_stop_price() {
        let mut closes = vec![200.0; 60];
        closes.push(196.0);
        let result = run(&closes);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_relative_eq!(trade.entry_price, 200.0);
        assert_relative_eq!(trade.exit_price, 199.0);
        assert_relative_eq!(trade.pnl_percent, -0.6, epsilon = 1e-9);
        assert_eq!(result.summary.stop_loss_exits, 1);
        assert_eq!(result.summary.losing_trades, 1);
    }

    #[test]
    fn trailing_stop_locks_in_gain() {
        // entry at bar 50 with ATR 1; bar 51 arms the trail at 202.5 - 1.5
        let mut closes = vec![200.0; 51];
        closes.push(202.0);
        closes.push(200.0);
        let result = run(&closes);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_relative_eq!(trade.exit_price, 201.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl_percent, 0.4, epsilon = 1e-9);
        assert!(trade.is_win());
    }

    #[test]
    fn flat_tape_times_out_after_max_hold() {
        let closes = vec![200.0; 171];
        let result = run(&closes);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Timeout);
        assert_eq!(trade.holding_hours(), 120);
        assert_relative_eq!(trade.pnl_percent, -0.1, epsilon = 1e-9);
    }

    #[test]
    fn trade_open_at_end_is_not_reported() {
        let closes = vec![200.0; 80];
        let result = run(&closes);
        assert!(result.trades.is_empty());
        assert!(!result.is_failed());
    }
}

mod bulk_scan {
    use super::*;

    #[test]
    fn failures_are_isolated() {
        let port = MockDataPort::new()
            .with_symbol("GOOD.NS", trending_daily(210, 0.5), hourly_from_closes(210, &[200.0; 61]))
            .with_error("DOWN.NS", "vendor timeout")
            .with_bars("HALF.NS", Timeframe::Daily, trending_daily(210, 0.5));

        let symbols: Vec<String> = ["GOOD.NS", "DOWN.NS", "HALF.NS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scan = Backtester::with_aggregator(BacktestConfig::default(), FixedBuy::boxed(1.0, 3.0))
            .run_scan(&port, &symbols);

        assert_eq!(scan.summary.symbols_scanned, 3);
        assert_eq!(scan.summary.symbols_failed, 2);
        assert_eq!(scan.failed[0].symbol, "DOWN.NS");
        assert!(scan.failed[0].reason.contains("vendor timeout"));
        assert_eq!(scan.failed[1].symbol, "HALF.NS");
        assert!(!scan.results[0].is_failed());
        assert_eq!(scan.trades.len(), scan.summary.total_trades);
    }

    #[test]
    fn portfolio_summary_over_trades() {
        let mut stop_closes = vec![200.0; 60];
        stop_closes.push(196.0);
        let mut trail_closes = vec![200.0; 51];
        trail_closes.extend([202.0, 200.0]);

        let port = MockDataPort::new()
            .with_symbol("LOSER", trending_daily(210, 0.5), hourly_from_closes(210, &stop_closes))
            .with_symbol("WINNER", trending_daily(210, 0.5), hourly_from_closes(210, &trail_closes));
        let symbols = port.list_symbols().unwrap();
        assert_eq!(symbols, vec!["LOSER", "WINNER"]);

        let scan = Backtester::with_aggregator(BacktestConfig::default(), FixedBuy::boxed(1.0, 3.0))
            .run_scan(&port, &symbols);

        let summary = &scan.summary;
        assert_eq!(summary.total_trades, 2);
        assert_relative_eq!(summary.trades_per_symbol, 1.0);
        assert_relative_eq!(summary.win_rate, 50.0);
        assert_relative_eq!(summary.total_pnl_percent, -0.2, epsilon = 1e-9);
        assert_relative_eq!(summary.profit_factor, 0.4 / 0.6, epsilon = 1e-9);
    }
}

mod files_on_disk {
    use super::*;
    use std::fs;
    use stockflow::adapters::csv_adapter::CsvAdapter;
    use stockflow::adapters::file_config_adapter::FileConfigAdapter;
    use stockflow::adapters::json_report_adapter::JsonReportAdapter;
    use stockflow::domain::settings::Settings;
    use stockflow::ports::report_port::ReportPort;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, data_dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.path().join("stockflow.ini");
        let content = format!(
            "[data]\ndir = {}\nsymbols = tcs.ns, sbin.ns\n\n\
             [aggregator]\nstrategy = hierarchical\n\n\
             [backtest]\nlookback_bars = 60\nslippage = 0.001\n",
            data_dir.display()
        );
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn csv_and_config_drive_a_scan() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("bars");
        fs::create_dir_all(&data_dir).unwrap();
        write_bar_csv(&data_dir, "TCS.NS", Timeframe::Daily, &trending_daily(260, 0.5));
        write_bar_csv(&data_dir, "TCS.NS", Timeframe::Hourly, &oscillating_hourly(260, 150));
        write_bar_csv(&data_dir, "SBIN.NS", Timeframe::Daily, &trending_daily(260, -0.2));

        let config_path = write_config(&dir, &data_dir);
        let config = FileConfigAdapter::from_file(&config_path).unwrap();
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.symbols, vec!["TCS.NS", "SBIN.NS"]);
        assert_eq!(settings.backtest.lookback_bars, 60);

        let data = CsvAdapter::new(settings.data_dir.clone());
        assert_eq!(data.list_symbols().unwrap(), vec!["SBIN.NS", "TCS.NS"]);

        let scan = Backtester::new(settings.backtest.clone()).run_scan(&data, &settings.symbols);
        assert_eq!(scan.summary.symbols_scanned, 2);
        assert_eq!(scan.failed.len(), 1);
        assert_eq!(scan.failed[0].symbol, "SBIN.NS");

        let out = dir.path().join("out").join("scan.json");
        JsonReportAdapter::new().write_scan(&scan, &out).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["summary"]["symbols_scanned"], 2);
        assert_eq!(json["results"][0]["symbol"], "TCS.NS");
    }

    #[test]
    fn trade_log_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut closes = vec![200.0; 60];
        closes.push(196.0);
        write_bar_csv(dir.path(), "LT.NS", Timeframe::Daily, &trending_daily(210, 0.5));
        write_bar_csv(dir.path(), "LT.NS", Timeframe::Hourly, &hourly_from_closes(210, &closes));

        let data = CsvAdapter::new(dir.path().to_path_buf());
        let daily = data.fetch_bars("LT.NS", Timeframe::Daily).unwrap();
        let hourly = data.fetch_bars("LT.NS", Timeframe::Hourly).unwrap();
        let result =
            Backtester::with_aggregator(BacktestConfig::default(), FixedBuy::boxed(1.0, 3.0))
                .run_symbol(&daily, &hourly)
                .unwrap();
        assert_eq!(result.trades.len(), 1);

        let path = dir.path().join("trades.csv");
        JsonReportAdapter::new().write_trades(&result.trades, &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "LT.NS");
        assert_eq!(&rows[0][6], "STOP_LOSS");
    }
}
