//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), maintained with a running window sum.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if period > 0 && i >= period {
            window_sum -= bars[i - period].close;
        }

        let valid = period > 0 && i + 1 >= period;
        let value = if valid {
            window_sum / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(value),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

/// Latest SMA and whether it is above its value `lookback` points earlier.
///
/// Only valid SMA points count toward the lookback; with too little SMA
/// history the comparison falls back to current == prior, i.e. not rising.
pub fn sma_with_slope(series: &IndicatorSeries, lookback: usize) -> Option<(f64, bool)> {
    let valid = series.valid_simple_values();
    let current = *valid.last()?;
    let prior = if valid.len() > lookback {
        valid[valid.len() - 1 - lookback]
    } else {
        current
    };
    Some((current, current > prior))
}
