//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::comparison::{ComparisonResult, PeriodReturn, compare};
use crate::domain::config_validation::{Settings, build_settings};
use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::projection::{ProjectionResult, project};
use crate::domain::relative_strength::{RelativeStrength, calculate_relative_strength};
use crate::domain::scoring::{ScoreResult, score};
use crate::domain::watchlist::{BenchmarkRef, ScanReport, fetch_benchmark, parse_codes, scan};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "trendscore", about = "Stock strength scoring against a benchmark index")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// INI configuration file
    #[arg(short, long)]
    pub config: PathBuf,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Strength score with the rule-by-rule explanation
    Score {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        code: String,
    },
    /// Projected price range over the coming months
    Project {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        code: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        months: Option<u32>,
    },
    /// Relative strength against the configured benchmark
    RelativeStrength {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        code: String,
    },
    /// Period returns next to the benchmark
    Compare {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        code: String,
    },
    /// Score a watchlist and keep the codes at or above the threshold
    Scan {
        #[command(flatten)]
        common: CommonArgs,
        /// Comma separated codes, overriding `[scan] codes`
        #[arg(long)]
        codes: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,
    },
    /// List available symbols on the configured exchange
    ListSymbols {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Show data range for symbol(s)
    Info {
        #[command(flatten)]
        common: CommonArgs,
        /// Defaults to the `[scan] codes` watchlist
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Score { common, code } => run_score(&common, &code),
        Command::Project {
            common,
            code,
            months,
        } => run_project(&common, &code, months),
        Command::RelativeStrength { common, code } => run_relative_strength(&common, &code),
        Command::Compare { common, code } => run_compare(&common, &code),
        Command::Scan {
            common,
            codes,
            threshold,
        } => run_scan(&common, codes.as_deref(), threshold),
        Command::ListSymbols { common } => run_list_symbols(&common),
        Command::Info { common, code } => run_info(&common, code.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: &PathBuf) -> Result<Settings, TrendscoreError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    build_settings(&adapter)
}

fn open(common: &CommonArgs) -> Result<(Settings, CsvAdapter), TrendscoreError> {
    let settings = load_settings(&common.config)?;
    let adapter = CsvAdapter::new(settings.data_path.clone());
    Ok((settings, adapter))
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn require_benchmark(settings: &Settings) -> Result<&BenchmarkRef, TrendscoreError> {
    settings
        .scan
        .benchmark
        .as_ref()
        .ok_or_else(|| TrendscoreError::ConfigMissing {
            section: "benchmark".into(),
            key: "code".into(),
        })
}

fn fetch_range(
    data_port: &dyn DataPort,
    code: &str,
    exchange: &str,
    (start, end): (NaiveDate, NaiveDate),
) -> Result<Vec<OhlcvBar>, TrendscoreError> {
    let bars = data_port.fetch_ohlcv(code, exchange, start, end)?;
    info!(code, bars = bars.len(), %start, %end, "fetched");
    Ok(bars)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), TrendscoreError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{text}");
    Ok(())
}

fn run_score(common: &CommonArgs, code: &str) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let code = normalize_code(code);
    let series = fetch_range(
        &adapter,
        &code,
        settings.exchange(),
        settings.window().score_range(),
    )?;
    let benchmark = fetch_benchmark(&adapter, &settings.scan);

    let result = score(&series, benchmark.as_deref())?;
    if common.json {
        print_json(&result)
    } else {
        print_score(&result);
        Ok(())
    }
}

fn print_score(result: &ScoreResult) {
    println!(
        "{}  score {}/100  {}  price {:.2}",
        result.symbol, result.strength_score, result.trend, result.current_price
    );
    for (key, line) in &result.explanation {
        println!("  {:<20} {}", key, line);
    }
    let ind = &result.indicators;
    println!(
        "  EMA 10/20/50 {:.2}/{:.2}/{:.2}  RSI {:.2}  ADX {:.2}  ATR {:.2}  vol {:.2}%",
        ind.emas.ema_10, ind.emas.ema_20, ind.emas.ema_50, ind.rsi, ind.adx, ind.atr, ind.volatility
    );
}

fn run_project(
    common: &CommonArgs,
    code: &str,
    months: Option<u32>,
) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let code = normalize_code(code);
    let months = months.unwrap_or(settings.scan.projection_months);
    let series = fetch_range(
        &adapter,
        &code,
        settings.exchange(),
        settings.window().score_range(),
    )?;

    let result = project(&series, months)?;
    if common.json {
        print_json(&result)
    } else {
        print_projection(&result);
        Ok(())
    }
}

fn print_projection(result: &ProjectionResult) {
    let r = &result.projected_range;
    println!(
        "{}  {:.2} -> {:.2} .. {:.2} .. {:.2} in {}  (confidence {})",
        result.symbol,
        result.current_price,
        r.low,
        r.mid,
        r.high,
        result.timeframe,
        result.confidence
    );
    println!("  {}", result.basis);
}

fn run_relative_strength(common: &CommonArgs, code: &str) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let bench = require_benchmark(&settings)?;
    let code = normalize_code(code);
    let range = settings.window().score_range();
    let series = fetch_range(&adapter, &code, settings.exchange(), range)?;
    let benchmark = fetch_range(&adapter, &bench.code, &bench.exchange, range)?;

    let rs = calculate_relative_strength(&series, &benchmark)?.rounded();
    if common.json {
        print_json(&rs)
    } else {
        print_relative_strength(&code, &bench.code, &rs);
        Ok(())
    }
}

fn print_relative_strength(code: &str, benchmark: &str, rs: &RelativeStrength) {
    println!(
        "{} vs {}: RS {:.2} (max {:.2}), {:?}, {:+.2}% vs benchmark{}",
        code,
        benchmark,
        rs.current_rs,
        rs.max_rs,
        rs.trend,
        rs.vs_benchmark_percent,
        if rs.is_new_high { ", at new high" } else { "" }
    );
}

fn run_compare(common: &CommonArgs, code: &str) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let bench = require_benchmark(&settings)?;
    let code = normalize_code(code);
    let range = settings.window().comparison_range();
    let series = fetch_range(&adapter, &code, settings.exchange(), range)?;
    let benchmark = fetch_range(&adapter, &bench.code, &bench.exchange, range)?;

    let result = compare(&series, &benchmark)?;
    if common.json {
        print_json(&result)
    } else {
        print_comparison(&bench.code, &result);
        Ok(())
    }
}

fn format_return(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:+.2}%", v))
}

fn print_comparison(benchmark: &str, result: &ComparisonResult) {
    println!("{} vs {} ({} common bars)", result.symbol, benchmark, result.common_bars);
    for (label, PeriodReturn { stock, benchmark: index }) in &result.returns {
        println!(
            "  {:<3} {:>10} {:>10}",
            label,
            format_return(*stock),
            format_return(*index)
        );
    }
}

fn run_scan(
    common: &CommonArgs,
    codes_override: Option<&str>,
    threshold: Option<u8>,
) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let codes = match codes_override {
        Some(s) => parse_codes(s)?,
        None => settings.codes.clone().ok_or_else(|| TrendscoreError::ConfigMissing {
            section: "scan".into(),
            key: "codes".into(),
        })?,
    };

    let mut config = settings.scan.clone();
    if let Some(t) = threshold {
        config.threshold = t;
    }

    let report = scan(&adapter, &codes, &config);
    if common.json {
        print_json(&report)
    } else {
        print_scan(&report);
        Ok(())
    }
}

fn print_scan(report: &ScanReport) {
    println!(
        "{} of {} codes scored {} or more",
        report.qualifying.len(),
        report.total_analyzed,
        report.threshold
    );
    for entry in &report.qualifying {
        let projection = match &entry.projection {
            Some(p) => format!(
                "{:.2} .. {:.2} in {} ({})",
                p.projected_range.low, p.projected_range.high, p.timeframe, p.confidence
            ),
            None => "no projection".to_string(),
        };
        println!(
            "  {:<12} {:>3}  {:<8} {:>10.2}  {}",
            entry.symbol,
            entry.analysis.strength_score,
            entry.analysis.trend,
            entry.analysis.current_price,
            projection
        );
    }
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.code, skipped.reason);
    }
}

fn run_list_symbols(common: &CommonArgs) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let symbols = adapter.list_symbols(settings.exchange())?;

    if common.json {
        return print_json(&symbols);
    }
    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", settings.exchange());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DataRange {
    code: String,
    exchange: String,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
    bars: usize,
}

fn run_info(common: &CommonArgs, code: Option<&str>) -> Result<(), TrendscoreError> {
    let (settings, adapter) = open(common)?;
    let codes = resolve_codes(code, &settings)?;
    let exchange = settings.exchange();

    let mut ranges = Vec::with_capacity(codes.len());
    for c in &codes {
        let range = match adapter.get_data_range(c, exchange)? {
            Some((first, last, bars)) => DataRange {
                code: c.clone(),
                exchange: exchange.to_string(),
                first: Some(first),
                last: Some(last),
                bars,
            },
            None => DataRange {
                code: c.clone(),
                exchange: exchange.to_string(),
                first: None,
                last: None,
                bars: 0,
            },
        };
        ranges.push(range);
    }

    if common.json {
        return print_json(&ranges);
    }
    for r in &ranges {
        match (r.first, r.last) {
            (Some(first), Some(last)) => {
                println!("{}.{}: {} bars, {} to {}", r.code, r.exchange, r.bars, first, last)
            }
            _ => eprintln!("{}.{}: no data found", r.code, r.exchange),
        }
    }
    Ok(())
}

/// An explicit code wins; otherwise the configured watchlist.
pub fn resolve_codes(
    code_override: Option<&str>,
    settings: &Settings,
) -> Result<Vec<String>, TrendscoreError> {
    if let Some(c) = code_override {
        return Ok(parse_codes(c)?);
    }
    settings.codes.clone().ok_or_else(|| TrendscoreError::ConfigMissing {
        section: "scan".into(),
        key: "codes".into(),
    })
}
