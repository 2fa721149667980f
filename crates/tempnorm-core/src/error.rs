// crates/tempnorm-core/src/error.rs

use tempnorm_parser::AdapterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Adapter(#[from] AdapterError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Matching error: {0}")]
    Matching(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
