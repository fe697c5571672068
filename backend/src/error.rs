//! Error types for the dashboard data pipeline.
//!
//! - [`CsvError`] - CSV decoding and parsing errors
//! - [`ShapeError`] - Column resolution errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`ValidationError`] - Output contract violations
//! - [`PipelineError`] - Top-level panel errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a dataset file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Shaping Errors
// =============================================================================

/// Errors while resolving the columns a panel needs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// No header matches the requested column.
    #[error("Column not found: {column} (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// A logical column name was empty.
    #[error("Column name must not be empty")]
    EmptyColumnName,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used.
    #[error("Invalid value for {key}: '{value}' ({message})")]
    Invalid {
        key: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Shaped output that breaks the numeric column contract.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Output contract violated for '{panel}': {errors:?}")]
    Contract { panel: String, errors: Vec<String> },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level panel errors.
///
/// Returned by every panel in [`crate::transform::panels`] and by
/// [`crate::transform::pipeline::Dashboard`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Column resolution error.
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Output contract error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A request parameter cannot be honoured.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Could not bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for column resolution.
pub type ShapeResult<T> = Result<T, ShapeError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
