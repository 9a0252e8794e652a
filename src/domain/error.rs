//! Domain error types.

use crate::domain::watchlist::CodeListError;

/// Top-level error type for trendscore.
///
/// The analysis engine only ever raises [`TrendscoreError::DataInsufficient`];
/// the remaining variants belong to the data source, configuration and CLI
/// collaborators around it.
#[derive(Debug, thiserror::Error)]
pub enum TrendscoreError {
    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    DataInsufficient {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("data source error: {reason}")]
    Database { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("projection horizon of {months} months is outside 1..={max}")]
    InvalidHorizon { months: u32, max: u32 },

    #[error(transparent)]
    CodeList(#[from] CodeListError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendscoreError {
    pub fn insufficient(code: &str, bars: usize, minimum: usize) -> Self {
        TrendscoreError::DataInsufficient {
            code: code.to_string(),
            bars,
            minimum,
        }
    }

    pub fn is_data_insufficient(&self) -> bool {
        matches!(self, TrendscoreError::DataInsufficient { .. })
    }
}

impl From<&TrendscoreError> for std::process::ExitCode {
    fn from(err: &TrendscoreError) -> Self {
        let code: u8 = match err {
            TrendscoreError::Io(_) => 1,
            TrendscoreError::ConfigParse { .. }
            | TrendscoreError::ConfigMissing { .. }
            | TrendscoreError::ConfigInvalid { .. }
            | TrendscoreError::InvalidHorizon { .. } => 2,
            TrendscoreError::Database { .. } => 3,
            TrendscoreError::CodeList(_) => 4,
            TrendscoreError::DataInsufficient { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
