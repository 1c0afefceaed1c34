//! Text embedding backends.
//!
//! Every backend implements [`EmbeddingProvider`]:
//! - [`HashedEmbedder`] is a deterministic lexical embedder (no model files needed).
//! - [`BertEmbedder`] runs a local sentence-transformer through candle.
//! - [`RemoteEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`CachedEmbedder`] memoizes any of the above.

/// BERT sentence embedder (mean pooling).
pub mod bert;
/// Embedding cache wrapper.
pub mod cached;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Feature-hashing embedder.
pub mod hashed;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// HTTP embedding client.
pub mod remote;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use bert::{BertEmbedder, BertEmbedderConfig};
pub use cached::CachedEmbedder;
pub use error::EmbeddingError;
pub use hashed::HashedEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use remote::{RemoteEmbedder, RemoteEmbedderConfig};

/// Produces fixed-length vectors for text.
///
/// `embed_batch` must return one vector per input, in input order, and each vector must
/// equal what `embed` returns for the same text. The default implementation embeds
/// sequentially; backends with native batching override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts, order-preserving.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Output vector length.
    fn dimensions(&self) -> usize;
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Inner product of two equal-length vectors (0.0 on length mismatch).
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity; 0.0 for mismatched lengths or zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot(a, b) / (norm_a * norm_b)
    }
}
