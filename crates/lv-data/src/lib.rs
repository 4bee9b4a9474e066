//! Record store and data ingestion for the linked housing views

pub mod config;
pub mod schema;
pub mod sources;
pub mod store;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{DatasetConfig, ScatterAttributes};
pub use schema::{Dimension, DimensionKind, DimensionSpec, Domain, Schema};
pub use sources::{rows_from_batch, CsvSource};
pub use store::{RawRow, Record, RecordSet, RecordStore, Value};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),

    /// A declared-continuous field is not a finite number
    #[error("Row {row}: field '{field}' has non-numeric value '{value}'")]
    DataFormat {
        row: usize,
        field: String,
        value: String,
    },

    #[error("Row {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("Duplicate dimension '{0}' in schema")]
    DuplicateDimension(String),

    #[error("Unknown dimension '{0}'")]
    UnknownDimension(String),

    /// A view names the same dimension twice
    #[error("Dimension '{0}' is used twice by one view")]
    RepeatedDimension(String),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
