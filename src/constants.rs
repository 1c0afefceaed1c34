//! Cross-cutting, shared constants.
//!
//! Component configs default to these values; [`crate::config::Config`] can override most
//! of them from the environment.

/// Dimension of the hashed stub embedder (matches all-MiniLM-L6-v2).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Max tokens fed to the BERT embedder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Entries kept by the query-embedding cache.
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 4096;

/// Hard limit on ingredients explained per analysis.
pub const MAX_SELECTED_INGREDIENTS: usize = 6;

/// Knowledge documents retrieved per ingredient when explaining.
pub const DEFAULT_EXPLAIN_TOP_K: usize = 3;

/// Knowledge documents retrieved per chat turn.
pub const DEFAULT_CHAT_KNOWLEDGE_TOP_K: usize = 4;

/// Recency window bounds (messages).
pub const MIN_RECENT_WINDOW: usize = 6;
pub const MAX_RECENT_WINDOW: usize = 10;
pub const DEFAULT_RECENT_WINDOW: usize = MIN_RECENT_WINDOW;

/// Semantic-channel defaults.
pub const DEFAULT_SIMILAR_LIMIT: usize = 4;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.78;

/// Generation defaults.
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4.1";
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Remote message-embedding model.
pub const DEFAULT_MESSAGE_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Candidate length bounds (exclusive, in characters).
pub const MIN_CANDIDATE_LEN: usize = 2;
pub const MAX_CANDIDATE_LEN: usize = 40;
