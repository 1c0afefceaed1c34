//! Curated ingredient knowledge corpus and its exact similarity index.
//!
//! Records come from a [`KnowledgeSource`], are validated into [`KnowledgeDocument`]s,
//! embedded once, and frozen inside a [`KnowledgeIndex`]. After construction the index
//! is read-only: share it behind an `Arc` and query it from any number of tasks.

pub mod document;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod fixtures;
pub mod index;
pub mod source;


pub use document::{KnowledgeDocument, KnowledgeRecord, REQUIRED_FIELDS};
pub use error::{KnowledgeError, RecordError};
pub use index::{KnowledgeIndex, SearchHit};
pub use source::{DirectoryKnowledgeSource, InMemoryKnowledgeSource, KnowledgeSource};
