//! Volume ratio: latest volume over the mean of the trailing window.

use crate::domain::ohlcv::OhlcvBar;

/// `None` when there are fewer than `period` bars. A zero trailing mean
/// yields 1.0.
pub fn volume_ratio(bars: &[OhlcvBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    let mean = window.iter().map(|b| b.volume as f64).sum::<f64>() / period as f64;
    let latest = bars.last()?.volume as f64;
    if mean > 0.0 {
        Some(latest / mean)
    } else {
        Some(1.0)
    }
}
