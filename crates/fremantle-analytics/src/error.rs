//! Error types for analytics operations.

use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while aligning series or computing metrics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A series or column had no usable observations
    #[error("Series '{0}' has no observations")]
    EmptySeries(String),

    /// Two inputs that must be the same length were not
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A column was requested that the frame does not contain
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The same column name was supplied twice
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// The normal-equations matrix could not be inverted
    #[error("Singular design matrix in regression '{0}'")]
    SingularMatrix(String),

    /// Not enough observations to fit the requested model
    #[error("Insufficient observations: need more than {required}, got {actual}")]
    InsufficientObservations {
        /// Number of estimated parameters
        required: usize,
        /// Number of observations supplied
        actual: usize,
    },

    /// The factor index is too short to place the analysis windows
    #[error("Insufficient history: need {required} trading days, got {actual}")]
    InsufficientHistory {
        /// Trading days required
        required: usize,
        /// Trading days available
        actual: usize,
    },
}
