//! Concrete port implementations.

pub mod csv_adapter;
pub mod file_config_adapter;
