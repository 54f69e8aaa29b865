//! Error taxonomy for the scan pipeline.

use thiserror::Error;

/// Malformed or absent input. Nothing is mutated when this is returned.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("no scan data provided")]
    EmptyBatch,
    #[error("scan data must be an array of rows")]
    NotABatch,
    #[error("row {index}: expected an array of fields")]
    NotARow { index: usize },
    #[error("row {index}: expected at least 4 fields, found {found}")]
    TooFewFields { index: usize, found: usize },
    #[error("row {index}: identifier must be a non-empty string or a number")]
    InvalidIdentifier { index: usize },
    #[error("row {index}: {field} is not a finite number")]
    NotNumeric { index: usize, field: &'static str },
    #[error("row {index}: {field} {value} is out of range")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("row {index}: timestamp must be a string or number")]
    InvalidTimestamp { index: usize },
}

/// Batch cannot be ranked by the outlier model. Nothing is mutated.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("batch too small: need {needed} rows, have {have}")]
    TooFewRows { needed: usize, have: usize },
    #[error("every feature has zero variance; outlier ranking is undefined")]
    ZeroVariance,
    #[error("contamination {0} must be in (0, 0.5]")]
    InvalidContamination(f64),
    #[error("ensemble needs at least one tree")]
    NoTrees,
}

/// Durable persistence failure. Logged, never surfaced to `analyze` callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("payload encryption failed")]
    Crypto,
    #[error("payload decode: {0}")]
    Decode(String),
    #[error("document store: {0}")]
    Remote(String),
}

/// Failures `analyze` can return to its caller.
#[derive(Debug, Error, PartialEq)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Model(#[from] ModelError),
}
