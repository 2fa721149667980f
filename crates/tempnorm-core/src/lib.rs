pub mod config;
pub mod error;
pub mod matcher;
pub mod pipelines;
pub mod records;
pub mod standardize;
pub mod statistics;

pub use error::{PipelineError, Result};
