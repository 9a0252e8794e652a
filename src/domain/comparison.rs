//! Period returns of an instrument next to its benchmark.

use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::{OhlcvBar, series_code};
use crate::domain::relative_strength::align_closes;
use crate::domain::snapshot::round2;

/// (label, bars back) for each reported period.
pub const PERIODS: [(&str, usize); 4] = [("1d", 1), ("1m", 20), ("3m", 60), ("1y", 252)];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodReturn {
    pub stock: Option<f64>,
    pub benchmark: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub symbol: String,
    pub common_bars: usize,
    pub returns: IndexMap<String, PeriodReturn>,
}

/// Percent change from `bars_back` bars before the last value to the last
/// value, rounded to 2 decimals. `None` when the series is too short or the
/// base is zero.
pub fn period_return(values: &[f64], bars_back: usize) -> Option<f64> {
    let last = *values.last()?;
    let base = *values.get(values.len().checked_sub(bars_back + 1)?)?;
    if base == 0.0 {
        return None;
    }
    Some(round2((last / base - 1.0) * 100.0))
}

pub fn compare(
    series: &[OhlcvBar],
    benchmark: &[OhlcvBar],
) -> Result<ComparisonResult, TrendscoreError> {
    let aligned = align_closes(series, benchmark);
    if aligned.is_empty() {
        return Err(TrendscoreError::insufficient(series_code(series), 0, 1));
    }

    let stock: Vec<f64> = aligned.iter().map(|&(_, c, _)| c).collect();
    let bench: Vec<f64> = aligned.iter().map(|&(_, _, b)| b).collect();

    let returns = PERIODS
        .iter()
        .map(|&(label, back)| {
            (
                label.to_string(),
                PeriodReturn {
                    stock: period_return(&stock, back),
                    benchmark: period_return(&bench, back),
                },
            )
        })
        .collect();

    Ok(ComparisonResult {
        symbol: series_code(series).to_string(),
        common_bars: aligned.len(),
        returns,
    })
}
