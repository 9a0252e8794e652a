//! Price history port.

use crate::domain::error::TrendscoreError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Source of daily OHLCV series.
///
/// `fetch_ohlcv` returns the bars of `code` on `exchange` dated within
/// `[start_date, end_date]`, sorted ascending by date. An unknown code is a
/// `Database` error; a known code with no bars in range is an empty vector.
pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendscoreError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendscoreError>;

    /// First date, last date and bar count of everything stored for `code`.
    fn get_data_range(
        &self,
        code: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TrendscoreError>;
}
