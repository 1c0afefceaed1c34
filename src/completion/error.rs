use std::time::Duration;

use thiserror::Error;

/// Failures of a single completion call. Calls are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion timed out after {}s", after.as_secs_f32())]
    Timeout { after: Duration },

    #[error("completion transport error: {reason}")]
    Transport { reason: String },

    #[error("completion returned no text")]
    EmptyResponse,
}

impl CompletionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
