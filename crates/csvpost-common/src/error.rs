//! Error types for CSV post imports

use thiserror::Error;

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, CsvPostError>;

/// Main error type for the import pipeline
///
/// Parse-level variants (`Io`, `Format`, `NoData`, `InputTooLarge`,
/// `ColumnCount`) abort a whole batch. `DateFormat` and `Store` are raised
/// per row and are caught by the importer.
#[derive(Error, Debug)]
pub enum CsvPostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid CSV format: {0}")]
    Format(String),

    #[error("No CSV data provided")]
    NoData,

    #[error("Input is too large: {size} bytes (maximum allowed is {max} bytes)")]
    InputTooLarge { size: u64, max: u64 },

    #[error("Error on line {line}: Incorrect number of columns. Expected {expected}, got {actual}")]
    ColumnCount {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid date format: '{value}'. Expected one of: {expected}")]
    DateFormat { value: String, expected: String },

    #[error("Content store error during {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sanitizer setup error: {0}")]
    Sanitizer(#[from] regex::Error),
}

impl CsvPostError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            CsvPostError::Io(_) => "io_error",
            CsvPostError::Format(_) => "format_error",
            CsvPostError::NoData => "no_data",
            CsvPostError::InputTooLarge { .. } => "input_too_large",
            CsvPostError::ColumnCount { .. } => "column_count",
            CsvPostError::DateFormat { .. } => "date_format",
            CsvPostError::Store { .. } => "store_error",
            CsvPostError::Config(_) => "config_error",
            CsvPostError::Serialization(_) => "serialization_error",
            CsvPostError::Sanitizer(_) => "sanitizer_error",
        }
    }

    /// Shorthand for a content store failure
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CsvPostError::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
