//! Configuration validation.
//!
//! Every key is checked before any series is fetched; a valid config is
//! turned into [`Settings`].

use crate::domain::error::TrendscoreError;
use crate::domain::projection::MAX_PROJECTION_MONTHS;
use crate::domain::watchlist::{AnalysisWindow, BenchmarkRef, ScanConfig, parse_codes};
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 183;
pub const MIN_LOOKBACK_DAYS: i64 = 90;
pub const DEFAULT_COMPARISON_DAYS: i64 = 365;
pub const DEFAULT_THRESHOLD: i64 = 65;
pub const DEFAULT_PROJECTION_MONTHS: i64 = 3;
pub const DEFAULT_MAX_WORKERS: i64 = 4;

pub const KNOWN_SECTIONS: [&str; 4] = ["data", "benchmark", "analysis", "scan"];

/// Everything the commands need from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub scan: ScanConfig,
    /// Watchlist from `[scan] codes`, if configured.
    pub codes: Option<Vec<String>>,
}

impl Settings {
    pub fn exchange(&self) -> &str {
        &self.scan.exchange
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.scan.window
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TrendscoreError> {
    build_settings(config).map(|_| ())
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, TrendscoreError> {
    for section in unknown_sections(config) {
        warn!(section = %section, "ignoring unknown config section");
    }

    let data_path = PathBuf::from(required(config, "data", "path")?);
    let exchange = required(config, "data", "exchange")?;

    let benchmark = non_empty(config, "benchmark", "code").map(|code| BenchmarkRef {
        code: code.to_uppercase(),
        exchange: non_empty(config, "benchmark", "exchange").unwrap_or_else(|| exchange.clone()),
    });

    let window = build_window(config)?;

    let threshold = int_key(config, "scan", "threshold", DEFAULT_THRESHOLD)?;
    if !(0..=100).contains(&threshold) {
        return Err(invalid("scan", "threshold", "threshold must be between 0 and 100"));
    }
    let projection_months = int_key(
        config,
        "scan",
        "projection_months",
        DEFAULT_PROJECTION_MONTHS,
    )?;
    let projection_months = u32::try_from(projection_months)
        .ok()
        .filter(|m| (1..=MAX_PROJECTION_MONTHS).contains(m))
        .ok_or_else(|| {
            invalid(
                "scan",
                "projection_months",
                &format!("projection_months must be between 1 and {MAX_PROJECTION_MONTHS}"),
            )
        })?;
    let max_workers = int_key(config, "scan", "max_workers", DEFAULT_MAX_WORKERS)?;
    let max_workers = usize::try_from(max_workers)
        .ok()
        .filter(|w| *w >= 1)
        .ok_or_else(|| invalid("scan", "max_workers", "max_workers must be at least 1"))?;

    let codes = match non_empty(config, "scan", "codes") {
        Some(s) => Some(parse_codes(&s)?),
        None => None,
    };

    Ok(Settings {
        data_path,
        scan: ScanConfig {
            exchange,
            benchmark,
            window,
            threshold: threshold as u8,
            projection_months,
            max_workers,
        },
        codes,
    })
}

pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect()
}

fn build_window(config: &dyn ConfigPort) -> Result<AnalysisWindow, TrendscoreError> {
    let as_of = match non_empty(config, "analysis", "as_of") {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|_| {
                invalid("analysis", "as_of", "invalid as_of format, expected YYYY-MM-DD")
            })?,
        None => Utc::now().date_naive(),
    };

    let lookback_days = int_key(config, "analysis", "lookback_days", DEFAULT_LOOKBACK_DAYS)?;
    if lookback_days < MIN_LOOKBACK_DAYS {
        return Err(invalid(
            "analysis",
            "lookback_days",
            &format!("lookback_days must be at least {MIN_LOOKBACK_DAYS}"),
        ));
    }
    let comparison_days = int_key(config, "analysis", "comparison_days", DEFAULT_COMPARISON_DAYS)?;
    if comparison_days < lookback_days {
        return Err(invalid(
            "analysis",
            "comparison_days",
            "comparison_days must not be shorter than lookback_days",
        ));
    }

    Ok(AnalysisWindow {
        as_of,
        lookback_days,
        comparison_days,
    })
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TrendscoreError> {
    non_empty(config, section, key).ok_or_else(|| TrendscoreError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })
}

/// An integer key that may be absent but must parse when present.
fn int_key(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TrendscoreError> {
    match non_empty(config, section, key) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| invalid(section, key, &format!("{key} must be an integer"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendscoreError {
    TrendscoreError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
