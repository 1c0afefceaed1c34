use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
/// Errors raised while loading or querying the knowledge corpus.
pub enum KnowledgeError {
    /// The corpus location itself cannot be read.
    #[error("knowledge source unavailable at '{path}': {reason}")]
    SourceUnavailable {
        /// Corpus location.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Embedding a document or query failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Stored and query vectors disagree on length.
    #[error("vector dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Offending vector length.
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
/// Why a single record was refused admission to the index.
pub enum RecordError {
    /// One or more required fields are absent.
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field is present but has the wrong shape.
    #[error("field '{field}' {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}
