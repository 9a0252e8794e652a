//! Forward price-range projection.
//!
//! Drift comes from the EMA(10)/EMA(50) relationship: +2% per month when
//! EMA(10) is above EMA(50), -1% per month otherwise. The band around the
//! projected midpoint is ATR(14) as a fraction of price, widened linearly
//! with the horizon. Confidence grows with the EMA(10)/EMA(50) divergence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::domain::error::TrendscoreError;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::ohlcv::{OhlcvBar, series_code};
use crate::domain::snapshot::{ATR_PERIOD, EmaSet, MIN_SNAPSHOT_BARS, compute_emas, round2};

pub const UPWARD_DRIFT_PER_MONTH: f64 = 0.02;
pub const DOWNWARD_DRIFT_PER_MONTH: f64 = 0.01;
/// Downward drift reaches zero at this horizon.
pub const MAX_PROJECTION_MONTHS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upward,
    Downward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upward => f.write_str("upward"),
            Direction::Downward => f.write_str("downward"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Low,
    #[serde(rename = "Low-Moderate")]
    LowModerate,
    Moderate,
}

impl Confidence {
    /// From |ema10 - ema50| / ema50 in percent.
    pub fn from_divergence(percent: f64) -> Self {
        if percent > 5.0 {
            Confidence::Moderate
        } else if percent > 2.0 {
            Confidence::LowModerate
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::Low => "Low",
            Confidence::LowModerate => "Low-Moderate",
            Confidence::Moderate => "Moderate",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// The unrounded projection arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionModel {
    pub direction: Direction,
    pub multiplier: f64,
    pub atr_percent: f64,
    pub range: ProjectedRange,
    pub confidence: Confidence,
}

pub fn drift_multiplier(direction: Direction, months: u32) -> f64 {
    match direction {
        Direction::Upward => 1.0 + UPWARD_DRIFT_PER_MONTH * months as f64,
        Direction::Downward => (1.0 - DOWNWARD_DRIFT_PER_MONTH * months as f64).max(0.0),
    }
}

pub fn project_from(current_close: f64, emas: &EmaSet, atr: f64, months: u32) -> ProjectionModel {
    let direction = if emas.ema_10 > emas.ema_50 {
        Direction::Upward
    } else {
        Direction::Downward
    };
    let multiplier = drift_multiplier(direction, months);
    let mid = current_close * multiplier;

    let atr_percent = if current_close != 0.0 {
        atr / current_close * 100.0
    } else {
        0.0
    };
    let band = mid * (atr_percent / 100.0) * months as f64;

    let divergence = if emas.ema_50 != 0.0 {
        ((emas.ema_10 - emas.ema_50) / emas.ema_50).abs() * 100.0
    } else {
        0.0
    };

    ProjectionModel {
        direction,
        multiplier,
        atr_percent,
        range: ProjectedRange {
            low: mid - band,
            mid,
            high: mid + band,
        },
        confidence: Confidence::from_divergence(divergence),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub symbol: String,
    pub current_price: f64,
    pub projected_range: ProjectedRange,
    pub timeframe: String,
    pub confidence: Confidence,
    pub basis: String,
    pub timestamp: DateTime<Utc>,
}

/// Project `months` ahead from the last bar of `series`.
///
/// `months` must lie in `1..=MAX_PROJECTION_MONTHS`.
pub fn project(series: &[OhlcvBar], months: u32) -> Result<ProjectionResult, TrendscoreError> {
    if !(1..=MAX_PROJECTION_MONTHS).contains(&months) {
        return Err(TrendscoreError::InvalidHorizon {
            months,
            max: MAX_PROJECTION_MONTHS,
        });
    }
    if series.len() < MIN_SNAPSHOT_BARS {
        return Err(TrendscoreError::insufficient(
            series_code(series),
            series.len(),
            MIN_SNAPSHOT_BARS,
        ));
    }
    let last = series
        .last()
        .ok_or_else(|| TrendscoreError::insufficient(series_code(series), 0, MIN_SNAPSHOT_BARS))?;

    let emas = compute_emas(series)?;
    let atr = calculate_atr(series, ATR_PERIOD)
        .last_simple()
        .ok_or_else(|| TrendscoreError::insufficient(&last.code, series.len(), ATR_PERIOD))?;

    let model = project_from(last.close, &emas, atr, months);
    debug!(code = %last.code, months, ?model, "projected");

    Ok(ProjectionResult {
        symbol: last.code.clone(),
        current_price: round2(last.close),
        projected_range: ProjectedRange {
            low: round2(model.range.low),
            mid: round2(model.range.mid),
            high: round2(model.range.high),
        },
        timeframe: format!("{} months", months),
        confidence: model.confidence,
        basis: format!(
            "Based on {} EMA trend and ATR volatility. \
             This is a probabilistic range, not a guarantee.",
            model.direction
        ),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn emas(ema_10: f64, ema_50: f64) -> EmaSet {
        EmaSet {
            ema_10,
            ema_20: (ema_10 + ema_50) / 2.0,
            ema_50,
        }
    }

    #[test]
    fn multipliers_for_three_months() {
        assert_abs_diff_eq!(drift_multiplier(Direction::Upward, 3), 1.06, epsilon = 1e-12);
        assert_abs_diff_eq!(drift_multiplier(Direction::Downward, 3), 0.97, epsilon = 1e-12);
    }

    #[test]
    fn upward_projection_arithmetic() {
        let m = project_from(200.0, &emas(190.0, 180.0), 4.0, 3);
        assert_eq!(m.direction, Direction::Upward);
        // mid = 212, atr% = 2, band = 212 * 0.02 * 3 = 12.72
        assert_abs_diff_eq!(m.range.mid, 212.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.atr_percent, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.range.low, 199.28, epsilon = 1e-9);
        assert_abs_diff_eq!(m.range.high, 224.72, epsilon = 1e-9);
        // |190 - 180| / 180 = 5.56% → Moderate
        assert_eq!(m.confidence, Confidence::Moderate);
    }

    #[test]
    fn downward_when_ema10_not_above_ema50() {
        let m = project_from(100.0, &emas(97.0, 100.0), 1.0, 3);
        assert_eq!(m.direction, Direction::Downward);
        assert_abs_diff_eq!(m.range.mid, 97.0, epsilon = 1e-9);
        assert_eq!(m.confidence, Confidence::LowModerate);

        let equal = project_from(100.0, &emas(100.0, 100.0), 1.0, 1);
        assert_eq!(equal.direction, Direction::Downward);
        assert_eq!(equal.confidence, Confidence::Low);
    }

    #[test]
    fn band_widens_with_horizon() {
        let one = project_from(100.0, &emas(101.0, 100.0), 2.0, 1);
        let six = project_from(100.0, &emas(101.0, 100.0), 2.0, 6);
        assert!(six.range.high - six.range.low > one.range.high - one.range.low);
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(Confidence::from_divergence(5.01), Confidence::Moderate);
        assert_eq!(Confidence::from_divergence(5.0), Confidence::LowModerate);
        assert_eq!(Confidence::from_divergence(2.0), Confidence::Low);
        assert_eq!(Confidence::LowModerate.to_string(), "Low-Moderate");
    }

    #[test]
    fn downward_drift_stops_at_zero() {
        assert_abs_diff_eq!(drift_multiplier(Direction::Downward, 100), 0.0, epsilon = 1e-12);
        assert_eq!(drift_multiplier(Direction::Downward, 150), 0.0);

        let m = project_from(50.0, &emas(40.0, 60.0), 5.0, 150);
        assert!(m.range.low <= m.range.mid && m.range.mid <= m.range.high);
        assert_eq!(m.range.mid, 0.0);
    }

    #[test]
    fn horizon_outside_bounds_is_rejected() {
        let bars: Vec<OhlcvBar> = Vec::new();
        for months in [0, MAX_PROJECTION_MONTHS + 1] {
            let err = project(&bars, months).unwrap_err();
            assert!(matches!(err, TrendscoreError::InvalidHorizon { max: 100, .. }));
        }
    }

    #[test]
    fn zero_price_does_not_produce_nan() {
        let m = project_from(0.0, &emas(0.0, 0.0), 1.0, 2);
        assert!(m.range.low.is_finite() && m.range.high.is_finite());
        assert_eq!(m.confidence, Confidence::Low);
    }
}
