use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_id} CSV error: {source}")]
    Csv {
        source_id: String,
        #[source]
        source: csv::Error,
    },

    #[error("{adapter} adapter: {source_id} has no column '{column}'")]
    MissingColumn {
        adapter: &'static str,
        source_id: String,
        column: String,
    },

    #[error("{adapter} adapter: {source_id} line {line_index} column '{column}' invalid: {message}")]
    InvalidField {
        adapter: &'static str,
        source_id: String,
        line_index: usize,
        column: String,
        message: String,
    },

    #[error("{adapter} adapter: {source_id} contains date {date} more than once")]
    DuplicateDate {
        adapter: &'static str,
        source_id: String,
        date: NaiveDate,
    },

    #[error("{adapter} adapter: {source_id} did not contain any usable rows")]
    EmptyData {
        adapter: &'static str,
        source_id: String,
    },

    #[error("{adapter} adapter configuration invalid: {message}")]
    Configuration {
        adapter: &'static str,
        message: String,
    },
}

impl AdapterError {
    /// Identifier of the source the error refers to, when it has one.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            AdapterError::Csv { source_id, .. }
            | AdapterError::MissingColumn { source_id, .. }
            | AdapterError::InvalidField { source_id, .. }
            | AdapterError::DuplicateDate { source_id, .. }
            | AdapterError::EmptyData { source_id, .. } => Some(source_id),
            AdapterError::Io { .. } | AdapterError::Configuration { .. } => None,
        }
    }
}
