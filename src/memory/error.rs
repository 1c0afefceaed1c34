use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::knowledge::KnowledgeError;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("message store error: {reason}")]
    Store { reason: String },

    #[error("message embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("knowledge lookup failed: {0}")]
    Knowledge(#[from] KnowledgeError),
}
