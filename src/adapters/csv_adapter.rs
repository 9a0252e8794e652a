//! CSV directory data adapter.
//!
//! One file per instrument named `<CODE>_<EXCHANGE>.csv` with the header
//! `date,open,high,low,close,volume` and ISO dates.

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

fn db_error(reason: String) -> TrendscoreError {
    TrendscoreError::Database { reason }
}

fn field<T>(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<T, TrendscoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(index)
        .ok_or_else(|| db_error(format!("line {line}: missing {name} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| db_error(format!("line {line}: invalid {name} value {raw:?}: {e}")))
}

/// Volumes are whole numbers but some exports write them as floats; those
/// are rounded to the nearest share.
fn volume_field(record: &StringRecord, line: u64) -> Result<i64, TrendscoreError> {
    match field::<i64>(record, 5, "volume", line) {
        Ok(v) => Ok(v),
        Err(_) => field::<f64>(record, 5, "volume", line).map(|v| v.round() as i64),
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }

    fn read_all(&self, code: &str, exchange: &str) -> Result<Vec<OhlcvBar>, TrendscoreError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path)
            .map_err(|e| db_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| db_error(format!("{}: {}", path.display(), e)))?;
            let line = record.position().map_or(0, |p| p.line());

            bars.push(OhlcvBar {
                code: code.to_string(),
                exchange: exchange.to_string(),
                date: field(&record, 0, "date", line)?,
                open: field(&record, 1, "open", line)?,
                high: field(&record, 2, "high", line)?,
                low: field(&record, 3, "low", line)?,
                close: field(&record, 4, "close", line)?,
                volume: volume_field(&record, line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendscoreError> {
        let mut bars = self.read_all(code, exchange)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendscoreError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            db_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| db_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(&suffix) {
                if !code.is_empty() {
                    symbols.push(code.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscoreError> {
        if !self.csv_path(code, exchange).exists() {
            return Ok(None);
        }
        let bars = self.read_all(code, exchange)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
