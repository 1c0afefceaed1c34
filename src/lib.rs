//! FoodLens library crate (used by the `foodlens` binary and integration tests).
//!
//! Turns noisy OCR ingredient text into grounded, consumer-facing explanations and
//! answers follow-up questions against the same curated knowledge corpus.
//!
//! # Public API Surface
//!
//! ## Explanation path
//! - [`CandidateNormalizer`] - raw text to clean ingredient names
//! - [`KnowledgeIndex`] - exact cosine index over the knowledge corpus
//! - [`ConfidenceSelector`], [`SkipSet`] - ranked, bounded candidate selection
//! - [`GroundedExplainer`], [`Explanation`] - one batched, per-item isolated generation call
//! - [`ExplanationPipeline`], [`AnalysisOutcome`] - all of the above behind one call
//!
//! ## Chat path
//! - [`ConversationMemory`], [`BlendPolicy`] - recency + semantic + knowledge context
//! - [`ChatEngine`], [`ChatReply`] - one grounded chat turn
//!
//! ## Ports
//! - [`EmbeddingProvider`] - hashed, BERT (candle), remote and cached backends
//! - [`CompletionProvider`] - `genai` backed text generation
//! - [`MessageStore`], [`KnowledgeSource`] - persistence and corpus loading
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod chat;
pub mod completion;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod explain;
pub mod hashing;
pub mod knowledge;
pub mod memory;
pub mod normalize;
pub mod pipeline;
pub mod selection;

pub use chat::{ChatEngine, ChatError, ChatReply};
#[cfg(any(test, feature = "mock"))]
pub use completion::MockCompletionProvider;
pub use completion::{CompletionError, CompletionProvider, CompletionRequest, GenaiCompletion};
pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    BertEmbedder, CachedEmbedder, EmbeddingError, EmbeddingProvider, HashedEmbedder,
    RemoteEmbedder,
};
pub use explain::{ExplainError, Explanation, ExplanationItem, GroundedExplainer};
pub use hashing::{hash_text, hash_to_u64};
pub use knowledge::{
    DirectoryKnowledgeSource, InMemoryKnowledgeSource, KnowledgeDocument, KnowledgeError,
    KnowledgeIndex, KnowledgeSource, SearchHit,
};
pub use memory::{
    BlendPolicy, ContextBundle, ConversationMemory, InMemoryMessageStore, MemoryError, Message,
    MessageStore, RecencySemanticBlend, RetrievalPlan, Role,
};
pub use normalize::{CandidateNormalizer, normalize};
pub use pipeline::{AnalysisOutcome, ExplanationPipeline, FailureReason};
pub use selection::{
    ConfidenceSelector, EmptyReason, ScoredCandidate, SelectedSet, SelectionOutcome, SkipSet,
};
