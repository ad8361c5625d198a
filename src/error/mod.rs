//! Error handling for the preparation pipeline.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

pub mod util;

/// Specialized error type for the preparation pipeline
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Error processing Arrow data
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error reported by the spreadsheet reader
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    /// A required sheet is absent from the workbook
    #[error("Sheet '{sheet}' not found (available: {})", available.join(", "))]
    MissingSheet {
        /// The sheet that was requested
        sheet: String,
        /// The sheets the workbook does contain
        available: Vec<String>,
    },

    /// The loaded data does not match the expected shape
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A row's code field does not match its expected pattern
    #[error("Format error for employee {employee_id}: {field} = {value:?}: {reason}")]
    FormatError {
        /// Key of the offending row
        employee_id: String,
        /// Name of the field that failed to parse
        field: &'static str,
        /// Raw value, if any
        value: Option<String>,
        /// Why the value was rejected
        reason: String,
    },

    /// Error converting records to or from a serialized form
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A statistic could not be computed for the given data
    #[error("Statistics error: {0}")]
    StatisticsError(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PrepError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError(message.into())
    }

    /// Create a statistics error
    pub fn statistics(message: impl Into<String>) -> Self {
        Self::StatisticsError(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether this error concerns a single row rather than the whole input
    #[must_use]
    pub fn is_row_level(&self) -> bool {
        matches!(self, Self::FormatError { .. })
    }
}

impl From<serde_arrow::Error> for PrepError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PrepError>;
