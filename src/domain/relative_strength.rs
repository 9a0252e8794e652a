//! Relative strength of an instrument against a benchmark index.
//!
//! Both close series are inner-joined on date; the ratio series
//! instrument/benchmark is normalized so that it starts at 100.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::{OhlcvBar, series_code};
use crate::domain::snapshot::round2;

/// Within 2% of the window high still counts as a new high.
pub const NEAR_HIGH_TOLERANCE: f64 = 0.98;
/// Bars back used for the outperforming/underperforming call.
pub const TREND_LOOKBACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsTrend {
    Outperforming,
    Underperforming,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStrength {
    pub current_rs: f64,
    pub max_rs: f64,
    pub is_new_high: bool,
    pub trend: RsTrend,
    pub vs_benchmark_percent: f64,
}

impl RelativeStrength {
    /// Reporting form with values rounded to 2 decimals; the flags keep the
    /// decisions taken on the unrounded values.
    pub fn rounded(&self) -> RelativeStrength {
        RelativeStrength {
            current_rs: round2(self.current_rs),
            max_rs: round2(self.max_rs),
            is_new_high: self.is_new_high,
            trend: self.trend,
            vs_benchmark_percent: round2(self.vs_benchmark_percent),
        }
    }
}

pub fn is_near_high(current_rs: f64, max_rs: f64) -> bool {
    current_rs >= max_rs * NEAR_HIGH_TOLERANCE
}

/// Pairs of (instrument close, benchmark close) on the dates both series
/// share, in the instrument's date order.
pub fn align_closes(series: &[OhlcvBar], benchmark: &[OhlcvBar]) -> Vec<(NaiveDate, f64, f64)> {
    let bench: HashMap<NaiveDate, f64> = benchmark.iter().map(|b| (b.date, b.close)).collect();
    series
        .iter()
        .filter_map(|bar| bench.get(&bar.date).map(|&bc| (bar.date, bar.close, bc)))
        .collect()
}

/// The normalized RS index (base 100 on the first common date).
///
/// Dates where the benchmark closed at or below zero carry no ratio and are
/// dropped from the join.
pub fn rs_index(series: &[OhlcvBar], benchmark: &[OhlcvBar]) -> Result<Vec<f64>, TrendscoreError> {
    if series.is_empty() || benchmark.is_empty() {
        return Err(TrendscoreError::insufficient(series_code(series), 0, 1));
    }

    let ratios: Vec<f64> = align_closes(series, benchmark)
        .into_iter()
        .filter(|&(_, _, bc)| bc > 0.0)
        .map(|(_, c, bc)| c / bc)
        .collect();

    let base = match ratios.first() {
        Some(&b) if b > 0.0 => b,
        _ => return Err(TrendscoreError::insufficient(series_code(series), 0, 1)),
    };

    Ok(ratios.iter().map(|r| r / base * 100.0).collect())
}

pub fn calculate_relative_strength(
    series: &[OhlcvBar],
    benchmark: &[OhlcvBar],
) -> Result<RelativeStrength, TrendscoreError> {
    let index = rs_index(series, benchmark)?;
    let n = index.len();
    let current_rs = index[n - 1];
    let max_rs = index.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let reference = if n > TREND_LOOKBACK {
        index[n - 1 - TREND_LOOKBACK]
    } else {
        current_rs
    };
    let trend = if current_rs > reference {
        RsTrend::Outperforming
    } else {
        RsTrend::Underperforming
    };

    Ok(RelativeStrength {
        current_rs,
        max_rs,
        is_new_high: is_near_high(current_rs, max_rs),
        trend,
        vs_benchmark_percent: (current_rs / 100.0 - 1.0) * 100.0,
    })
}
