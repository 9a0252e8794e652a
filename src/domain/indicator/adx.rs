//! Average Directional Index.
//!
//! Trend strength only, not direction. Built from +DM/-DM and true range,
//! each Wilder-smoothed over n; DX = |+DI - -DI| / (+DI + -DI) * 100, and
//! ADX is DX Wilder-smoothed over n again.
//!
//! Warmup: the first valid ADX lands on bar index 2n - 1.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

/// Wilder smoothing; output index 0 corresponds to input index `period - 1`.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut acc = values[..period].iter().sum::<f64>() / period as f64;
    out.push(acc);
    for v in &values[period..] {
        acc = (acc * (period - 1) as f64 + v) / period as f64;
        out.push(acc);
    }
    out
}

fn directional_movement(prev: &OhlcvBar, curr: &OhlcvBar) -> (f64, f64) {
    let up = curr.high - prev.high;
    let down = prev.low - curr.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values: Vec<IndicatorPoint> = bars
        .iter()
        .map(|b| IndicatorPoint {
            date: b.date,
            valid: false,
            value: IndicatorValue::Simple(0.0),
        })
        .collect();

    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Adx(period),
            values,
        };
    }

    let mut plus_dm = Vec::with_capacity(bars.len() - 1);
    let mut minus_dm = Vec::with_capacity(bars.len() - 1);
    let mut tr = Vec::with_capacity(bars.len() - 1);
    for w in bars.windows(2) {
        let (p, m) = directional_movement(&w[0], &w[1]);
        plus_dm.push(p);
        minus_dm.push(m);
        tr.push(w[1].true_range(w[0].close));
    }

    let s_plus = wilder_smooth(&plus_dm, period);
    let s_minus = wilder_smooth(&minus_dm, period);
    let s_tr = wilder_smooth(&tr, period);

    let dx: Vec<f64> = s_tr
        .iter()
        .zip(s_plus.iter().zip(&s_minus))
        .map(|(&atr, (&p, &m))| {
            if atr == 0.0 {
                return 0.0;
            }
            let plus_di = p / atr * 100.0;
            let minus_di = m / atr * 100.0;
            let sum = plus_di + minus_di;
            if sum > 0.0 {
                (plus_di - minus_di).abs() / sum * 100.0
            } else {
                0.0
            }
        })
        .collect();

    // dx[0] sits on bar `period`; adx[0] sits on bar `2 * period - 1`.
    for (j, adx) in wilder_smooth(&dx, period).into_iter().enumerate() {
        let point = &mut values[2 * period - 1 + j];
        point.valid = true;
        point.value = IndicatorValue::Simple(adx);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values,
    }
}
