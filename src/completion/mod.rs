//! Text-generation port.
//!
//! [`CompletionProvider`] is a single request/response exchange with an explicit
//! timeout. [`GenaiCompletion`] backs it with the `genai` multi-provider client.

pub mod client;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

pub use client::GenaiCompletion;
pub use error::CompletionError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockCompletionProvider;

use crate::constants::{DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_TEMPERATURE};

/// One system + user prompt exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// External text generation. Implementations must honour `request.timeout` and must
/// not retry on failure.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Runs `call` under `timeout`, mapping expiry to [`CompletionError::Timeout`].
pub async fn with_deadline<F>(timeout: Duration, call: F) -> Result<String, CompletionError>
where
    F: Future<Output = Result<String, CompletionError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout { after: timeout }),
    }
}
