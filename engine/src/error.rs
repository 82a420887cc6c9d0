//! Error types for the recast engine.
//!
//! Field-level failures are wrapped in [`Error::Field`] as they propagate out
//! of nested records and sequences, so the rendered message reads as a path
//! followed by the terminal cause: `Outer: Inner: types incompatible`.

use thiserror::Error;

/// All possible errors from the recast engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Precondition errors
    #[error("nil target")]
    NilTarget,

    #[error("target not a reference")]
    TargetNotReference,

    // Conversion errors
    #[error("types incompatible")]
    TypesIncompatible { from: String, to: String },

    #[error("cannot apply a sequence to a non-sequence value")]
    SequenceToNonSequence,

    #[error("cannot apply a non-sequence value to a sequence")]
    NonSequenceToSequence,

    #[error("nil source value")]
    NilSource,

    #[error("cyclic or excessively deep structure (depth limit {limit})")]
    TooDeep { limit: usize },

    #[error("rename collision on '{0}'")]
    RenameCollision(String),

    #[error("custom conversion failed: {0}")]
    Custom(String),

    // Strict mode errors
    #[error("no corresponding target field")]
    Unmapped,

    #[error("target field is not settable")]
    NotSettable,

    // Reflection errors
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("record {record} has {got} values for {expected} fields")]
    FieldCount {
        record: String,
        expected: usize,
        got: usize,
    },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid config: {0}")]
    Config(String),

    /// A failure inside the named field (or `[index]` sequence element).
    #[error("{field}: {inner}")]
    Field { field: String, inner: Box<Error> },
}

impl Error {
    /// Error for user-supplied conversion logic.
    pub fn custom(msg: impl Into<String>) -> Self {
        Error::Custom(msg.into())
    }

    /// Prefix the error with a field name.
    pub fn at(self, field: impl Into<String>) -> Self {
        Error::Field {
            field: field.into(),
            inner: Box::new(self),
        }
    }

    /// Prefix the error with a sequence position.
    pub fn at_index(self, index: usize) -> Self {
        self.at(format!("[{index}]"))
    }

    /// The terminal cause, with every path segment stripped.
    pub fn cause(&self) -> &Error {
        match self {
            Error::Field { inner, .. } => inner.cause(),
            other => other,
        }
    }

    /// Path segments from the root down to the failing field.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Error::Field { field, inner } = current {
            path.push(field.as_str());
            current = inner;
        }
        path
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
