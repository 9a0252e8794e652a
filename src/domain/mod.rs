//! Core domain types and the strength-score engine.

pub mod ohlcv;
pub mod indicator;
pub mod snapshot;
pub mod relative_strength;
pub mod scoring;
pub mod projection;
pub mod comparison;
pub mod watchlist;
pub mod config_validation;
pub mod error;
