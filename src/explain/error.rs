use thiserror::Error;

use crate::completion::CompletionError;
use crate::knowledge::KnowledgeError;

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("context retrieval failed: {0}")]
    Retrieval(#[from] KnowledgeError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ExplainError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Completion(e) if e.is_timeout())
    }
}
