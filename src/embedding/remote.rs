use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::EmbeddingError;
use super::{EmbeddingProvider, l2_normalize};
use crate::constants::DEFAULT_MESSAGE_EMBEDDING_MODEL;

/// Dimension of `text-embedding-3-small`.
pub const DEFAULT_REMOTE_DIMENSIONS: usize = 1536;

#[derive(Debug, Clone)]
/// Configuration for [`RemoteEmbedder`].
pub struct RemoteEmbedderConfig {
    /// Base URL; `/embeddings` is appended.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Expected vector length; responses of any other length are rejected.
    pub dimensions: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteEmbedderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: DEFAULT_MESSAGE_EMBEDDING_MODEL.to_string(),
            api_key: None,
            dimensions: DEFAULT_REMOTE_DIMENSIONS,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    client: reqwest::Client,
    config: RemoteEmbedderConfig,
}

impl RemoteEmbedder {
    pub fn new(config: RemoteEmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.base_url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "base_url is required".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(
            count = texts.len(),
            model = %self.config.model,
            "Requesting remote embeddings"
        );

        let mut request = self.client.post(self.config.endpoint()).json(&EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response: EmbeddingResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        order_vectors(response.data, texts.len(), self.config.dimensions)
    }
}

/// Restores input order from the `index` field and validates shape.
fn order_vectors(
    mut data: Vec<EmbeddingDatum>,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::BatchSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    data.sort_by_key(|d| d.index);

    data.into_iter()
        .map(|d| {
            if d.embedding.len() != dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimensions,
                    actual: d.embedding.len(),
                });
            }
            let mut vector = d.embedding;
            l2_normalize(&mut vector);
            Ok(vector)
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::BatchSizeMismatch {
            expected: 1,
            actual: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
