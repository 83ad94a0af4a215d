//! Error types for mutscan
//!
//! Every failure of a scan is fatal. The variants fall into four groups:
//! input validation, sequence/label consistency, model runtime, and shape
//! errors raised while assembling the score matrix.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Boxed error from a model runtime (ONNX runtime, hub download, ...).
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ScanError {
    // Input validation -------------------------------------------------------
    #[error("malformed mutation '{label}': {reason}")]
    MalformedMutation { label: String, reason: String },

    #[error("malformed indel list: {reason}")]
    MalformedIndel { reason: String },

    #[error("sequence contains {count} symbol(s) outside ACDEFGHIKLMNPQRSTVWY (first: '{first}')")]
    InvalidSequence { count: usize, first: char },

    #[error("the wild-type sequence is empty")]
    EmptySequence,

    #[error("invalid alignment: {0}")]
    InvalidAlignment(String),

    #[error("conflicting inputs: {0}")]
    ConflictingInputs(String),

    #[error("mutation '{label}' addresses position {position}, outside a sequence of length {length} (offset {offset})")]
    PositionOutOfRange {
        label: String,
        position: usize,
        length: usize,
        offset: usize,
    },

    // Consistency ------------------------------------------------------------
    #[error("mutation '{label}' lists wild type '{expected}' at position {position} but the sequence has '{found}'")]
    InconsistentMutation {
        label: String,
        position: usize,
        expected: char,
        found: char,
    },

    // Model / runtime --------------------------------------------------------
    #[error("sequence of length {length} exceeds the model limit of {max} residues")]
    UnsupportedSequenceLength { length: usize, max: usize },

    #[error("model '{model}' cannot be used with the '{strategy}' strategy: {reason}")]
    IncompatibleStrategy {
        model: String,
        strategy: String,
        reason: String,
    },

    #[error("alignment required: {0}")]
    MissingAlignment(String),

    #[error("symbol '{0}' is not in the model vocabulary")]
    UnknownSymbol(String),

    #[error("model backend error: {0}")]
    Backend(#[source] BackendError),

    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    // Shape ------------------------------------------------------------------
    #[error("cannot reshape {rows} scores into a {positions} x 20 matrix: {reason}")]
    ShapeMismatch {
        rows: usize,
        positions: usize,
        reason: String,
    },

    // Output -----------------------------------------------------------------
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl ScanError {
    pub fn backend<E: Into<BackendError>>(err: E) -> Self {
        ScanError::Backend(err.into())
    }

    pub(crate) fn malformed(label: &str, reason: impl Into<String>) -> Self {
        ScanError::MalformedMutation {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}
