//! Scripted completion provider for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompletionError, CompletionProvider, CompletionRequest, with_deadline};

/// Replays queued results, then falls back to a fixed reply.
///
/// Every request is recorded so tests can inspect the prompts that were sent.
#[derive(Debug, Default)]
pub struct MockCompletionProvider {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            fallback: reply.into(),
            ..Self::default()
        }
    }

    /// Queues a result for the next unscripted call.
    pub fn then(self, result: Result<String, CompletionError>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    /// Sleeps before answering; a delay longer than the request timeout times out.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let next = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));

        with_deadline(request.timeout, async {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            next
        })
        .await
    }
}
