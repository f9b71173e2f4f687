//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// Evaluation precondition failed.
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Ground truth could not be loaded.
    #[error("ground truth error: {0}")]
    GroundTruth(#[from] GroundTruthError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the metrics engine.
///
/// These are precondition violations: they abort the whole evaluation
/// instead of being folded into the metrics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Predictions and ground truth have different lengths.
    #[error(
        "predictions ({predictions}) and ground truth ({ground_truth}) must have same length"
    )]
    LengthMismatch {
        predictions: usize,
        ground_truth: usize,
    },

    /// Confidence list does not line up with the predictions.
    #[error("confidence scores ({confidences}) must match predictions ({predictions})")]
    ConfidenceLengthMismatch {
        predictions: usize,
        confidences: usize,
    },

    /// No ground truth was supplied or loaded.
    #[error("no ground truth available")]
    NoGroundTruth,
}

/// Errors related to ground truth files.
#[derive(Error, Debug)]
pub enum GroundTruthError {
    /// The file does not exist.
    #[error("ground truth file not found: {0}")]
    NotFound(String),

    /// The file extension is not a supported format.
    #[error("unsupported ground truth format: {0}")]
    UnsupportedFormat(String),

    /// A spreadsheet could not be opened or read.
    #[error("could not read spreadsheet: {0}")]
    Spreadsheet(String),

    /// A record could not be interpreted.
    #[error("invalid ground truth record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
