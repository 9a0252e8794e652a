//! OHLCV bar representation.
//!
//! A series is a `&[OhlcvBar]` in ascending date order, one bar per trading
//! day, belonging to a single symbol. Nothing in the engine mutates it.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Symbol of a series, or `"?"` when it is empty.
pub fn series_code(bars: &[OhlcvBar]) -> &str {
    bars.first().map(|b| b.code.as_str()).unwrap_or("?")
}
