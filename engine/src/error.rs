//! Error types for the injury aggregation engine.
//!
//! This module defines one error type per boundary:
//!
//! - [`ParseError`] - The parser collaborator could not decode an upload
//! - [`MalformedDatasetError`] - Parsed input is not a sequence of rows
//! - [`ConfigError`] - Engine configuration could not be loaded
//! - [`ExportError`] - Table export failed
//! - [`SessionError`] - Top-level errors returned by session transitions
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! An empty aggregation is deliberately absent from this list: it is a valid
//! result, see [`crate::session::EmptyAggregationResult`].

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors raised by a parser collaborator while decoding uploaded bytes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the upload.
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    /// The upload exceeds the configured size limit.
    #[error("Upload is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// The bytes could not be decoded into rows.
    #[error("Unreadable upload: {0}")]
    Unreadable(String),

    /// The decoding task was cancelled or panicked.
    #[error("Parser task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Unreadable(err.to_string())
    }
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// The normalizer received something other than a sequence of mappings.
#[derive(Debug, Error)]
pub enum MalformedDatasetError {
    /// The top-level value is not an array.
    #[error("Expected a sequence of rows, got {found}")]
    NotASequence { found: &'static str },

    /// A row inside the sequence is not an object.
    #[error("Row {index} is not a mapping (got {found})")]
    RowNotAMapping { index: usize, found: &'static str },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading [`crate::config::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for the expected shape.
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// A logical field has no source column configured.
    #[error("No source column configured for field '{0}'")]
    EmptyAliases(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while rendering aggregated rows as a table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Buffer flush error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Session Errors (top-level)
// =============================================================================

/// Errors returned by [`crate::session::Session`] transitions.
///
/// Every variant leaves the session in its pre-transition state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The parser collaborator failed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The parsed rows were not tabular.
    #[error("Malformed dataset: {0}")]
    Malformed(#[from] MalformedDatasetError),

    /// The selected group is not part of the current chart.
    #[error("Group '{0}' is not in the current chart")]
    UnknownGroup(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parser collaborators.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for table export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for session transitions.
pub type SessionResult<T> = Result<T, SessionError>;
