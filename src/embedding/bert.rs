//! Local sentence-transformer embedder (BERT family, e.g. all-MiniLM-L6-v2).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::device::select_device;
use super::error::EmbeddingError;
use super::{EmbeddingProvider, l2_normalize};
use crate::constants::DEFAULT_MAX_SEQ_LEN;

/// Configuration for [`BertEmbedder`].
#[derive(Debug, Clone)]
pub struct BertEmbedderConfig {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_dir: PathBuf,
    /// Inputs longer than this many tokens are truncated.
    pub max_seq_len: usize,
}

impl BertEmbedderConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("model.safetensors")
    }

    /// Checks that the model directory and all three files exist.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        for path in [
            self.config_path(),
            self.tokenizer_path(),
            self.weights_path(),
        ] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        Ok(())
    }
}

struct BertBackend {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
}

impl BertBackend {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(vec![0.0; self.hidden_size]);
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Generating BERT embedding"
        );

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // [1, seq_len, hidden_size]
        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over attended tokens.
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden_states.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?.squeeze(0)?;

        let mut embedding = pooled.to_vec1::<f32>()?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Sentence embedder backed by a candle BERT model.
///
/// Inference is CPU/GPU bound, so async callers are moved onto the blocking pool.
#[derive(Clone)]
pub struct BertEmbedder {
    backend: Arc<BertBackend>,
    config: BertEmbedderConfig,
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("model_dir", &self.config.model_dir)
            .field("device", &format!("{:?}", self.backend.device))
            .field("hidden_size", &self.backend.hidden_size)
            .finish()
    }
}

impl BertEmbedder {
    /// Loads model weights and tokenizer from `config.model_dir`.
    pub fn load(config: BertEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let device = select_device()?;
        debug!(?device, "Selected compute device for BERT embedder");

        let model_config = load_model_config(&config.config_path())?;
        let hidden_size = model_config.hidden_size;

        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[config.weights_path()], DType::F32, &device)?
        };

        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &model_config)
        } else {
            BertModel::load(vb, &model_config)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to load BERT weights: {}", e),
        })?;

        let tokenizer = load_tokenizer(&config.tokenizer_path(), config.max_seq_len)?;

        info!(
            model_dir = %config.model_dir.display(),
            hidden_size,
            max_seq_len = config.max_seq_len,
            "BERT embedder loaded"
        );

        Ok(Self {
            backend: Arc::new(BertBackend {
                model,
                tokenizer,
                device,
                hidden_size,
            }),
            config,
        })
    }

    pub fn config(&self) -> &BertEmbedderConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for BertEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let backend = Arc::clone(&self.backend);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || backend.embed(&text))
            .await
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("embedding task failed: {}", e),
            })?
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let backend = Arc::clone(&self.backend);
        let texts = texts.to_vec();
        // Sequential per text: no padding, so each vector matches the single-text path.
        tokio::task::spawn_blocking(move || texts.iter().map(|t| backend.embed(t)).collect())
            .await
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("embedding task failed: {}", e),
            })?
    }

    fn dimensions(&self) -> usize {
        self.backend.hidden_size
    }
}

fn load_model_config(path: &Path) -> Result<Config, EmbeddingError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| EmbeddingError::ModelLoadFailed {
        reason: format!("Failed to parse {}: {}", path.display(), e),
    })
}

fn load_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer, EmbeddingError> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("Failed to load tokenizer: {}", e),
        })?;

    tokenizer
        .with_padding(None)
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("Failed to configure truncation: {}", e),
        })?;

    Ok(tokenizer)
}
