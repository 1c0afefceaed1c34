use thiserror::Error;

use crate::completion::CompletionError;
use crate::memory::MemoryError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("session id is empty")]
    MissingSession,

    #[error("failed to gather conversation context: {0}")]
    Context(#[from] MemoryError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ChatError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Completion(e) if e.is_timeout())
    }
}
