//! Custom error types for the imputation engine.
//!
//! Only a structural mismatch between rows aborts a run. Everything else the
//! engine meets in the data (unparseable cells, out-of-range readings, empty
//! columns) is absorbed locally and reported through the run summary, so the
//! variants below are mostly about configuration and I/O at the edges.
//!
//! Errors are serializable so they can be emitted as JSON by the CLI.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation engine.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// A row's header set differs from the header set established by the run.
    #[error(
        "Structural mismatch at row {row}: missing columns {missing:?}, unexpected columns {unexpected:?}"
    )]
    StructuralMismatch {
        row: usize,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// The run was started without any columns.
    #[error("Input has no columns")]
    EmptyHeader,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the input.
    #[error("Column '{0}' not found in input")]
    ColumnNotFound(String),

    /// Internal error (broken invariant).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

impl From<ConfigValidationError> for ImputationError {
    fn from(err: ConfigValidationError) -> Self {
        ImputationError::InvalidConfig(err.to_string())
    }
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StructuralMismatch { .. } => "STRUCTURAL_MISMATCH",
            Self::EmptyHeader => "EMPTY_HEADER",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error aborted a run part way through the data.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::StructuralMismatch { .. } => true,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Row index reported by a structural mismatch, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::StructuralMismatch { row, .. } => Some(*row),
            Self::WithContext { source, .. } => source.row(),
            _ => None,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> ImputationError {
        ImputationError::StructuralMismatch {
            row: 7,
            missing: vec!["Hum".to_string()],
            unexpected: vec!["Humidity".to_string()],
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(mismatch().error_code(), "STRUCTURAL_MISMATCH");
        assert_eq!(
            ImputationError::ColumnNotFound("Temp".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_structural_mismatch_is_fatal() {
        assert!(mismatch().is_fatal());
        assert!(!ImputationError::EmptyHeader.is_fatal());
        assert!(!ImputationError::InvalidConfig("bad".to_string()).is_fatal());
    }

    #[test]
    fn test_mismatch_message_names_row_and_columns() {
        let message = mismatch().to_string();
        assert!(message.contains("row 7"));
        assert!(message.contains("Hum"));
        assert!(message.contains("Humidity"));
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&mismatch()).unwrap();
        assert!(json.contains("STRUCTURAL_MISMATCH"));
        assert!(json.contains("row 7"));
    }

    #[test]
    fn test_with_context_preserves_code_and_row() {
        let error = mismatch().with_context("While streaming rows");
        assert!(error.to_string().contains("While streaming rows"));
        assert_eq!(error.error_code(), "STRUCTURAL_MISMATCH");
        assert!(error.is_fatal());
        assert_eq!(error.row(), Some(7));
    }

    #[test]
    fn test_config_error_conversion() {
        let error: ImputationError = ConfigValidationError::InvalidWindowSize(0).into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
        assert!(error.to_string().contains("window"));
    }
}
