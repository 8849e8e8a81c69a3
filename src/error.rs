//! Error types for Medir operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Medir operations.
///
/// Covers the failure classes of a benchmark run: malformed specs caught
/// before any heavy work, unresolvable target/generator/metric references,
/// failures inside a timed operation, and shape mismatches when joining
/// result tables.
///
/// # Examples
///
/// ```
/// use medir::error::MedirError;
///
/// let err = MedirError::ShapeMismatch {
///     expected: "10 rows".to_string(),
///     actual: "9 rows".to_string(),
/// };
/// assert!(err.to_string().contains("shape mismatch"));
/// ```
#[derive(Debug)]
pub enum MedirError {
    /// Benchmark spec failed validation before execution.
    InvalidSpec {
        /// Validation failure message
        message: String,
    },

    /// Target implementation reference is not registered.
    UnknownTarget {
        /// The unresolved `<lib>.<name>` reference
        target: String,
    },

    /// Dataset generator id is not registered.
    UnknownGenerator {
        /// The unresolved generator id
        generator: String,
    },

    /// Metric name is not registered.
    UnknownMetric {
        /// The unresolved metric name
        metric: String,
    },

    /// A timed operation (fit/predict/transform) failed.
    Execution {
        /// Which operation failed
        operation: String,
        /// Underlying failure message
        message: String,
    },

    /// Two result tables cannot be joined row-for-row.
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape found
        actual: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Matrix is singular (non-invertible).
    SingularMatrix {
        /// Pivot value that collapsed to zero
        pivot: f64,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// CSV encoding/decoding error.
    Csv(csv::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for MedirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedirError::InvalidSpec { message } => {
                write!(f, "Invalid benchmark spec: {message}")
            }
            MedirError::UnknownTarget { target } => {
                write!(f, "Unknown target reference: {target}")
            }
            MedirError::UnknownGenerator { generator } => {
                write!(f, "Unknown dataset generator: {generator}")
            }
            MedirError::UnknownMetric { metric } => {
                write!(f, "Unknown metric: {metric}")
            }
            MedirError::Execution { operation, message } => {
                write!(f, "{operation} failed: {message}")
            }
            MedirError::ShapeMismatch { expected, actual } => {
                write!(f, "Table shape mismatch: expected {expected}, got {actual}")
            }
            MedirError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            MedirError::SingularMatrix { pivot } => {
                write!(f, "Singular matrix detected: pivot = {pivot}, cannot solve")
            }
            MedirError::Io(e) => write!(f, "I/O error: {e}"),
            MedirError::Csv(e) => write!(f, "CSV error: {e}"),
            MedirError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MedirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MedirError::Io(e) => Some(e),
            MedirError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MedirError {
    fn from(err: std::io::Error) -> Self {
        MedirError::Io(err)
    }
}

impl From<csv::Error> for MedirError {
    fn from(err: csv::Error) -> Self {
        MedirError::Csv(err)
    }
}

impl From<&str> for MedirError {
    fn from(msg: &str) -> Self {
        MedirError::Other(msg.to_string())
    }
}

impl From<String> for MedirError {
    fn from(msg: String) -> Self {
        MedirError::Other(msg)
    }
}

impl MedirError {
    /// Create an invalid-spec error with descriptive context.
    #[must_use]
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            message: message.into(),
        }
    }

    /// Create an execution error for a named operation.
    #[must_use]
    pub fn execution(operation: &str, message: impl Into<String>) -> Self {
        Self::Execution {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, MedirError>;
