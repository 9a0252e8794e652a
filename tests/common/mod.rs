#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use trendscore::domain::error::TrendscoreError;
pub use trendscore::domain::ohlcv::OhlcvBar;
use trendscore::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendscoreError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(TrendscoreError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(code).cloned().unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, TrendscoreError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
        _exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscoreError> {
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].date,
                bars[bars.len() - 1].date,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub const START: &str = "2024-01-01";

/// Closes compound by `daily_growth` per bar (0.01 is +1% a day). Highs and
/// lows sit 1% either side of the close, opens at the previous close.
pub fn compounding_bars(
    code: &str,
    count: usize,
    start_price: f64,
    daily_growth: f64,
    volume: i64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(START, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price * (1.0 + daily_growth).powi(i as i32);
            let open = if i == 0 {
                close
            } else {
                start_price * (1.0 + daily_growth).powi(i as i32 - 1)
            };
            OhlcvBar {
                code: code.to_string(),
                exchange: "NSE".to_string(),
                date: start + chrono::Duration::days(i as i64),
                open,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            }
        })
        .collect()
}

pub fn flat_bars(code: &str, count: usize, price: f64, volume: i64) -> Vec<OhlcvBar> {
    compounding_bars(code, count, price, 0.0, volume)
}

pub fn uptrend(code: &str) -> Vec<OhlcvBar> {
    compounding_bars(code, 120, 100.0, 0.01, 1_000_000)
}

pub fn downtrend(code: &str) -> Vec<OhlcvBar> {
    compounding_bars(code, 120, 100.0, -0.01, 1_000_000)
}

pub fn benchmark() -> Vec<OhlcvBar> {
    flat_bars("NIFTY", 120, 20_000.0, 0)
}

pub fn write_csv(dir: &Path, code: &str, exchange: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{}_{}.csv", code, exchange)), content).unwrap();
}
