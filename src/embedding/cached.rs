use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use tracing::debug;

use super::EmbeddingProvider;
use super::error::EmbeddingError;
use crate::constants::DEFAULT_EMBEDDING_CACHE_CAPACITY;
use crate::hashing::hash_text;

/// Memoizing wrapper around another [`EmbeddingProvider`].
///
/// Keys are BLAKE3 digests of the exact input text. Cached vectors are the ones the
/// inner provider returned, so single and batched calls stay interchangeable.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    entries: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("dimensions", &self.inner.dimensions())
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_capacity(inner, DEFAULT_EMBEDDING_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn EmbeddingProvider>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Approximate number of cached vectors.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = hash_text(text);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        self.entries.insert(key, Arc::new(vector.clone()));
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let keys: Vec<[u8; 32]> = texts.iter().map(|t| hash_text(t)).collect();
        let mut results: Vec<Option<Vec<f32>>> = keys
            .iter()
            .map(|k| self.entries.get(k).map(|v| v.as_ref().clone()))
            .collect();

        let missing: Vec<usize> = results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_none().then_some(i))
            .collect();

        if !missing.is_empty() {
            debug!(
                hits = texts.len() - missing.len(),
                misses = missing.len(),
                "Embedding cache batch lookup"
            );

            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.inner.embed_batch(&to_embed).await?;
            if vectors.len() != to_embed.len() {
                return Err(EmbeddingError::BatchSizeMismatch {
                    expected: to_embed.len(),
                    actual: vectors.len(),
                });
            }

            for (i, vector) in missing.into_iter().zip(vectors) {
                self.entries.insert(keys[i], Arc::new(vector.clone()));
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
