//! Watchlist scanning.
//!
//! Parses code lists, then scores every code of a watchlist against the
//! configured benchmark and keeps those at or above a threshold, each with a
//! forward projection attached. A code that cannot be fetched or scored is
//! reported as skipped and never aborts the scan.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::projection::{ProjectionResult, project};
use crate::domain::scoring::{ScoreResult, score};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeListError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, CodeListError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CodeListError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(CodeListError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// The date windows series are fetched over, ending at `as_of`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisWindow {
    pub as_of: NaiveDate,
    /// Calendar days of history for scoring and projection.
    pub lookback_days: i64,
    /// Calendar days of history for comparison returns.
    pub comparison_days: i64,
}

impl AnalysisWindow {
    pub fn score_range(&self) -> (NaiveDate, NaiveDate) {
        (self.as_of - Duration::days(self.lookback_days), self.as_of)
    }

    pub fn comparison_range(&self) -> (NaiveDate, NaiveDate) {
        (self.as_of - Duration::days(self.comparison_days), self.as_of)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRef {
    pub code: String,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub exchange: String,
    pub benchmark: Option<BenchmarkRef>,
    pub window: AnalysisWindow,
    pub threshold: u8,
    pub projection_months: u32,
    pub max_workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanEntry {
    pub symbol: String,
    pub analysis: ScoreResult,
    pub projection: Option<ProjectionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    FetchFailed { reason: String },
    InsufficientData { bars: usize, minimum: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => f.write_str("no data in window"),
            SkipReason::FetchFailed { reason } => write!(f, "fetch failed: {reason}"),
            SkipReason::InsufficientData { bars, minimum } => {
                write!(f, "insufficient data: have {bars} bars, need {minimum}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub qualifying: Vec<ScanEntry>,
    pub skipped: Vec<SkippedCode>,
    pub total_analyzed: usize,
    pub threshold: u8,
}

enum Outcome {
    Scored(ScanEntry),
    Skipped(SkippedCode),
}

/// Fetch the benchmark series for the scoring window. A failed or empty
/// fetch means the scan runs without relative strength.
pub fn fetch_benchmark(data_port: &dyn DataPort, config: &ScanConfig) -> Option<Vec<OhlcvBar>> {
    let bench = config.benchmark.as_ref()?;
    let (start, end) = config.window.score_range();
    match data_port.fetch_ohlcv(&bench.code, &bench.exchange, start, end) {
        Ok(bars) if !bars.is_empty() => Some(bars),
        Ok(_) => {
            warn!(code = %bench.code, "benchmark has no data in window");
            None
        }
        Err(e) => {
            warn!(code = %bench.code, error = %e, "benchmark fetch failed");
            None
        }
    }
}

fn analyze_code(
    data_port: &dyn DataPort,
    code: &str,
    config: &ScanConfig,
    benchmark: Option<&[OhlcvBar]>,
) -> Outcome {
    let skip = |reason: SkipReason| {
        warn!(code, %reason, "skipping");
        Outcome::Skipped(SkippedCode {
            code: code.to_string(),
            reason,
        })
    };

    let (start, end) = config.window.score_range();
    let bars = match data_port.fetch_ohlcv(code, &config.exchange, start, end) {
        Ok(bars) if bars.is_empty() => return skip(SkipReason::NoData),
        Ok(bars) => bars,
        Err(e) => {
            return skip(SkipReason::FetchFailed {
                reason: e.to_string(),
            });
        }
    };

    match score(&bars, benchmark) {
        Ok(analysis) => {
            let projection = match project(&bars, config.projection_months) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(code, error = %e, "projection unavailable");
                    None
                }
            };
            Outcome::Scored(ScanEntry {
                symbol: code.to_string(),
                analysis,
                projection,
            })
        }
        Err(TrendscoreError::DataInsufficient { bars, minimum, .. }) => {
            skip(SkipReason::InsufficientData { bars, minimum })
        }
        Err(e) => skip(SkipReason::FetchFailed {
            reason: e.to_string(),
        }),
    }
}

/// Score every code, fanning out over at most `max_workers` threads.
///
/// The report does not depend on the worker count: qualifying entries are
/// sorted by score descending then symbol, skipped codes keep input order.
pub fn scan(
    data_port: &(dyn DataPort + Sync),
    codes: &[String],
    config: &ScanConfig,
) -> ScanReport {
    info!(codes = codes.len(), threshold = config.threshold, "scanning watchlist");
    let benchmark = fetch_benchmark(data_port, config);
    let benchmark = benchmark.as_deref();

    let outcomes: Vec<Outcome> = match ThreadPoolBuilder::new()
        .num_threads(config.max_workers.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| {
            codes
                .par_iter()
                .map(|code| analyze_code(data_port, code, config, benchmark))
                .collect::<Vec<_>>()
        }),
        Err(e) => {
            warn!(error = %e, "worker pool unavailable, scanning sequentially");
            codes
                .iter()
                .map(|code| analyze_code(data_port, code, config, benchmark))
                .collect()
        }
    };

    let mut qualifying = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Scored(entry) if entry.analysis.strength_score >= config.threshold => {
                qualifying.push(entry)
            }
            Outcome::Scored(_) => {}
            Outcome::Skipped(s) => skipped.push(s),
        }
    }
    qualifying.sort_by(|a, b| {
        b.analysis
            .strength_score
            .cmp(&a.analysis.strength_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    info!(
        qualifying = qualifying.len(),
        skipped = skipped.len(),
        "scan complete"
    );

    ScanReport {
        qualifying,
        skipped,
        total_analyzed: codes.len(),
        threshold: config.threshold,
    }
}
