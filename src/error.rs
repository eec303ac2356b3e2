//! Error types for conditioning operations.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// Contextual input required by an assembly step was not supplied.
    #[error("Missing argument: {0} must be provided")]
    MissingArgument(&'static str),

    /// Variable type name is not one of the supported kinds.
    #[error("Unknown variable type '{0}'")]
    UnknownType(String),

    /// Condition tag is not one of the recognised tags.
    #[error("Unknown condition tag '{0}'")]
    UnknownTag(String),

    /// A declared tag is absent from the data mapping.
    #[error("Missing column for condition '{0}'")]
    MissingColumn(String),

    /// The tag was already declared on this conditioner.
    #[error("Condition '{0}' is already declared")]
    DuplicateTag(String),

    /// Column kind differs from what the transformer accepts.
    #[error("Schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: String, got: String },

    /// Number of components differs from the fitted transformer.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// Columns of one condition set do not share a row count.
    #[error("Row mismatch for '{tag}': expected {expected} rows, got {got}")]
    RowMismatch {
        tag: String,
        expected: usize,
        got: usize,
    },

    /// A level that was not seen (or declared) at fit time.
    #[error("Unknown category {level} in condition '{context}'")]
    UnknownCategory { level: String, context: String },

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid hyperparameter or argument value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Declared support does not fit the variable type.
    #[error("Invalid support for {kind}: {message}")]
    InvalidSupport { kind: &'static str, message: String },

    /// Numerical computation error.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A requested date is absent from a daily data file.
    #[error("Date {date} not found in {path}")]
    MissingDate { date: String, path: PathBuf },

    /// Persisted conditioner was written by an incompatible format version.
    #[error("Incompatible format: expected version {expected}, found {found}")]
    IncompatibleFormat { expected: u32, found: u32 },

    /// Failure reported by a user embedding model.
    #[error("User model error: {0}")]
    UserModel(String),

    /// Failed to parse a CSV data file.
    #[error("Failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`ConditionError`].
pub type Result<T> = std::result::Result<T, ConditionError>;

impl From<bincode::Error> for ConditionError {
    fn from(err: bincode::Error) -> Self {
        ConditionError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ConditionError {
    fn from(err: serde_json::Error) -> Self {
        ConditionError::Serialization(err.to_string())
    }
}
