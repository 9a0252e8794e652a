//! Annualized close-to-close volatility.
//!
//! r[i] = C[i] / C[i-1] - 1 (0 when C[i-1] == 0).
//! VOL(n)[i] = sample_stddev(r[i-n+1..=i]) * sqrt(252) * 100
//! Warmup: first n bars are invalid (n returns need n + 1 closes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn daily_returns(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| {
            if w[0].close == 0.0 {
                0.0
            } else {
                w[1].close / w[0].close - 1.0
            }
        })
        .collect()
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

pub fn calculate_volatility(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let returns = daily_returns(bars);
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            // returns[i - 1] is the return into bar i
            let valid = period >= 2 && i >= period;
            let value = if valid {
                sample_stddev(&returns[i - period..i]) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
            } else {
                0.0
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value: IndicatorValue::Simple(value),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Volatility(period),
        values,
    }
}
