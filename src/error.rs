//! Error types for the pcaviz library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PcaVizError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not parse table: {0}")]
    Parse(String),

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Expression column '{0}' contains non-numeric values")]
    NonNumericColumn(String),

    #[error("Missing value in expression column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Sample ID mismatch: {0}")]
    SampleMismatch(String),

    #[error("No overlapping sample names between expression and sample metadata")]
    NoOverlap,

    #[error("All samples have zero total counts; check the expression matrix")]
    AllZeroSamples,

    #[error("{channel} column '{column}' not found in sample metadata")]
    UnknownColumn { channel: String, column: String },

    #[error("Input too small for a 2-component projection: {0}")]
    DegenerateInput(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Renderer error: {0}")]
    Render(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse partition of errors for the request boundary.
///
/// Callers that front this library with an HTTP layer map `InvalidInput`
/// to a client-error status, `Upstream` to a gateway error, and
/// `Internal` to a generic server error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller's input was invalid; resubmitting corrected input recovers.
    InvalidInput,
    /// The external renderer failed.
    Upstream,
    /// Unexpected internal failure.
    Internal,
}

impl PcaVizError {
    /// Classify this error for status mapping at the request boundary.
    pub fn class(&self) -> ErrorClass {
        match self {
            PcaVizError::Csv(_)
            | PcaVizError::Parse(_)
            | PcaVizError::DuplicateColumn(_)
            | PcaVizError::NonNumericColumn(_)
            | PcaVizError::MissingValue { .. }
            | PcaVizError::SampleMismatch(_)
            | PcaVizError::NoOverlap
            | PcaVizError::AllZeroSamples
            | PcaVizError::UnknownColumn { .. }
            | PcaVizError::DegenerateInput(_) => ErrorClass::InvalidInput,
            PcaVizError::Render(_) => ErrorClass::Upstream,
            PcaVizError::Io(_) | PcaVizError::Numerical(_) | PcaVizError::Json(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// True when the caller can recover by correcting the uploaded input.
    pub fn is_input_error(&self) -> bool {
        self.class() == ErrorClass::InvalidInput
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PcaVizError>;
