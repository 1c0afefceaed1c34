//! Test double for embedding failures and call counting.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::error::EmbeddingError;
use super::{EmbeddingProvider, HashedEmbedder};

/// Hashed embedder that can be told to fail on specific texts or on every batch call.
#[derive(Debug, Default)]
pub struct MockEmbedder {
    inner: HashedEmbedder,
    fail_on: Vec<String>,
    fail_batches: bool,
    embed_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any call whose text contains one of `needles` (case-insensitive).
    pub fn failing_on<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail_on = needles
            .into_iter()
            .map(|s| s.into().to_lowercase())
            .collect();
        self
    }

    /// Makes every `embed_batch` call fail.
    pub fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn check(&self, text: &str) -> Result<(), EmbeddingError> {
        let lower = text.to_lowercase();
        if self.fail_on.iter().any(|n| lower.contains(n.as_str())) {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("mock failure for '{}'", text),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.check(text)?;
        Ok(self.inner.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches {
            return Err(EmbeddingError::RequestFailed {
                reason: "mock batch failure".to_string(),
            });
        }
        texts
            .iter()
            .map(|t| {
                self.check(t)?;
                Ok(self.inner.vectorize(t))
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
