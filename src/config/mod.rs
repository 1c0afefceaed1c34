//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `FOODLENS_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CHAT_KNOWLEDGE_TOP_K, DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_EMBEDDING_DIM,
    DEFAULT_EXPLAIN_TOP_K, DEFAULT_GENERATION_MODEL, DEFAULT_GENERATION_TIMEOUT_SECS,
    DEFAULT_MESSAGE_EMBEDDING_MODEL, DEFAULT_RECENT_WINDOW, DEFAULT_SIMILAR_LIMIT,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TEMPERATURE, MAX_RECENT_WINDOW,
    MAX_SELECTED_INGREDIENTS, MIN_RECENT_WINDOW,
};

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `FOODLENS_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of `*.json` knowledge documents. Default: `./knowledge`.
    pub knowledge_dir: PathBuf,

    /// BERT sentence-embedding model directory. `None` selects the hashed stub embedder.
    pub embedding_model_path: Option<PathBuf>,

    /// Output dimension of the hashed stub embedder. Default: `384`.
    pub embedding_dim: usize,

    /// Query-embedding cache capacity. Default: `4096`.
    pub embedding_cache_capacity: u64,

    /// OpenAI-compatible base URL used to embed chat messages.
    pub message_embedding_url: Option<String>,

    /// Remote embedding model name. Default: `text-embedding-3-small`.
    pub message_embedding_model: String,

    /// Bearer token for the remote embedding endpoint.
    pub api_key: Option<String>,

    /// Model name handed to the completion backend. Default: `gpt-4.1`.
    pub generation_model: String,

    /// Timeout for a single completion call. Default: 30s.
    pub generation_timeout: Duration,

    /// Sampling temperature. Default: `0.1`.
    pub temperature: f32,

    /// Max ingredients explained per analysis. Default: `6`.
    pub max_selected: usize,

    /// Context documents per ingredient. Default: `3`.
    pub explain_top_k: usize,

    /// Recency window size (clamped to 6..=10). Default: `6`.
    pub recent_window: usize,

    /// Semantic-channel result limit. Default: `4`.
    pub similar_limit: usize,

    /// Semantic-channel similarity cutoff. Default: `0.78`.
    pub similarity_threshold: f32,

    /// Knowledge documents per chat turn. Default: `4`.
    pub chat_knowledge_top_k: usize,
}

/// Default knowledge directory used when `FOODLENS_KNOWLEDGE_DIR` is not set.
pub const DEFAULT_KNOWLEDGE_DIR: &str = "./knowledge";

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from(DEFAULT_KNOWLEDGE_DIR),
            embedding_model_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            message_embedding_url: None,
            message_embedding_model: DEFAULT_MESSAGE_EMBEDDING_MODEL.to_string(),
            api_key: None,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            max_selected: MAX_SELECTED_INGREDIENTS,
            explain_top_k: DEFAULT_EXPLAIN_TOP_K,
            recent_window: DEFAULT_RECENT_WINDOW,
            similar_limit: DEFAULT_SIMILAR_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            chat_knowledge_top_k: DEFAULT_CHAT_KNOWLEDGE_TOP_K,
        }
    }
}

impl Config {
    const ENV_KNOWLEDGE_DIR: &'static str = "FOODLENS_KNOWLEDGE_DIR";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "FOODLENS_EMBEDDING_MODEL_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "FOODLENS_EMBEDDING_DIM";
    const ENV_EMBEDDING_CACHE_CAPACITY: &'static str = "FOODLENS_EMBEDDING_CACHE_CAPACITY";
    const ENV_MESSAGE_EMBEDDING_URL: &'static str = "FOODLENS_MESSAGE_EMBEDDING_URL";
    const ENV_MESSAGE_EMBEDDING_MODEL: &'static str = "FOODLENS_MESSAGE_EMBEDDING_MODEL";
    const ENV_API_KEY: &'static str = "FOODLENS_API_KEY";
    const ENV_GENERATION_MODEL: &'static str = "FOODLENS_GENERATION_MODEL";
    const ENV_GENERATION_TIMEOUT_SECS: &'static str = "FOODLENS_GENERATION_TIMEOUT_SECS";
    const ENV_TEMPERATURE: &'static str = "FOODLENS_TEMPERATURE";
    const ENV_MAX_SELECTED: &'static str = "FOODLENS_MAX_SELECTED";
    const ENV_EXPLAIN_TOP_K: &'static str = "FOODLENS_EXPLAIN_TOP_K";
    const ENV_RECENT_WINDOW: &'static str = "FOODLENS_RECENT_WINDOW";
    const ENV_SIMILAR_LIMIT: &'static str = "FOODLENS_SIMILAR_LIMIT";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "FOODLENS_SIMILARITY_THRESHOLD";
    const ENV_CHAT_KNOWLEDGE_TOP_K: &'static str = "FOODLENS_CHAT_KNOWLEDGE_TOP_K";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let generation_timeout_secs = Self::parse_number_from_env(
            Self::ENV_GENERATION_TIMEOUT_SECS,
            defaults.generation_timeout.as_secs(),
        )?;
        if generation_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: generation_timeout_secs.to_string(),
            });
        }

        let recent_window =
            Self::parse_number_from_env(Self::ENV_RECENT_WINDOW, defaults.recent_window)?
                .clamp(MIN_RECENT_WINDOW, MAX_RECENT_WINDOW);

        Ok(Self {
            knowledge_dir: Self::parse_path_from_env(
                Self::ENV_KNOWLEDGE_DIR,
                defaults.knowledge_dir,
            ),
            embedding_model_path: Self::parse_optional_from_env(Self::ENV_EMBEDDING_MODEL_PATH)
                .map(PathBuf::from),
            embedding_dim: Self::parse_number_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            embedding_cache_capacity: Self::parse_number_from_env(
                Self::ENV_EMBEDDING_CACHE_CAPACITY,
                defaults.embedding_cache_capacity,
            )?,
            message_embedding_url: Self::parse_optional_from_env(Self::ENV_MESSAGE_EMBEDDING_URL),
            message_embedding_model: Self::parse_optional_from_env(
                Self::ENV_MESSAGE_EMBEDDING_MODEL,
            )
            .unwrap_or(defaults.message_embedding_model),
            api_key: Self::parse_optional_from_env(Self::ENV_API_KEY),
            generation_model: Self::parse_optional_from_env(Self::ENV_GENERATION_MODEL)
                .unwrap_or(defaults.generation_model),
            generation_timeout: Duration::from_secs(generation_timeout_secs),
            temperature: Self::parse_number_from_env(
                Self::ENV_TEMPERATURE,
                defaults.temperature,
            )?,
            max_selected: Self::parse_number_from_env(
                Self::ENV_MAX_SELECTED,
                defaults.max_selected,
            )?,
            explain_top_k: Self::parse_number_from_env(
                Self::ENV_EXPLAIN_TOP_K,
                defaults.explain_top_k,
            )?,
            recent_window,
            similar_limit: Self::parse_number_from_env(
                Self::ENV_SIMILAR_LIMIT,
                defaults.similar_limit,
            )?,
            similarity_threshold: Self::parse_number_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.similarity_threshold,
            )?,
            chat_knowledge_top_k: Self::parse_number_from_env(
                Self::ENV_CHAT_KNOWLEDGE_TOP_K,
                defaults.chat_knowledge_top_k,
            )?,
        })
    }

    /// Validates paths and numeric invariants (does not touch the knowledge corpus).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge_dir.exists() && !self.knowledge_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.knowledge_dir.clone(),
            });
        }

        if let Some(ref path) = self.embedding_model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: "embedding_dim",
                reason: "must be greater than zero".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::OutOfRange {
                name: "temperature",
                reason: format!("must be between 0.0 and 2.0, got {}", self.temperature),
            });
        }

        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "similarity_threshold",
                reason: format!(
                    "must be between -1.0 and 1.0, got {}",
                    self.similarity_threshold
                ),
            });
        }

        for (name, value) in [
            ("max_selected", self.max_selected),
            ("explain_top_k", self.explain_top_k),
            ("chat_knowledge_top_k", self.chat_knowledge_top_k),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::parse_optional_from_env(var_name) {
            Some(value) => value
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    reason: e.to_string(),
                }),
            None => Ok(default),
        }
    }
}
