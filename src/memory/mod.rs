//! Per-session conversational memory.
//!
//! A chat turn is grounded on three independent lookups: the session's most recent
//! messages, the session's messages most similar to the new one, and the knowledge
//! index. A [`BlendPolicy`] decides how much each channel fetches and how the results
//! are combined.

mod error;
pub mod policy;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::MemoryError;
pub use policy::{
    BlendPolicy, ContextBundle, DedupBlend, KnowledgeSnippet, RecencySemanticBlend, RetrievalPlan,
};
pub use store::{InMemoryMessageStore, Message, MessageStore, Role, ScoredMessage};

use std::sync::Arc;

use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::KnowledgeIndex;

pub struct ConversationMemory {
    store: Arc<dyn MessageStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<KnowledgeIndex>,
    policy: Arc<dyn BlendPolicy>,
}

impl std::fmt::Debug for ConversationMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMemory")
            .field("plan", &self.policy.plan())
            .field("index", &self.index)
            .finish()
    }
}

impl ConversationMemory {
    /// Memory with the default [`RecencySemanticBlend`] policy.
    pub fn new(
        store: Arc<dyn MessageStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<KnowledgeIndex>,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            policy: Arc::new(RecencySemanticBlend::default()),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn BlendPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Embeds a message with the message embedder.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        Ok(self.embedder.embed(text).await?)
    }

    /// Embeds `user_message` and gathers its context.
    pub async fn build_context(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> Result<ContextBundle, MemoryError> {
        let embedding = self.embed(user_message).await?;
        self.build_context_with_embedding(session_id, user_message, &embedding)
            .await
    }

    /// Gathers context for a message whose embedding is already known.
    ///
    /// The three channels are fetched concurrently. The recency window is returned
    /// oldest first whatever order the store produced it in.
    pub async fn build_context_with_embedding(
        &self,
        session_id: &str,
        user_message: &str,
        embedding: &[f32],
    ) -> Result<ContextBundle, MemoryError> {
        let plan = self.policy.plan();

        let (mut recent, similar, knowledge) = tokio::try_join!(
            self.store.recent(session_id, plan.recent_window),
            self.store.similar(
                session_id,
                embedding,
                plan.similarity_threshold,
                plan.similar_limit
            ),
            async {
                let hits = self.index.search(user_message, plan.knowledge_top_k).await?;
                Ok::<_, MemoryError>(hits.iter().map(KnowledgeSnippet::from).collect::<Vec<_>>())
            },
        )?;

        recent.sort_by_key(|m| m.created_at);

        debug!(
            session_id,
            recent = recent.len(),
            similar = similar.len(),
            knowledge = knowledge.len(),
            "Built conversation context"
        );
        Ok(self.policy.blend(recent, similar, knowledge))
    }

    /// Embeds and stores a turn.
    pub async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        source: Option<&str>,
    ) -> Result<Message, MemoryError> {
        let embedding = self.embed(content).await?;
        self.append_with_embedding(session_id, role, content, embedding, source)
            .await
    }

    /// Stores a turn whose embedding is already known.
    pub async fn append_with_embedding(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        embedding: Vec<f32>,
        source: Option<&str>,
    ) -> Result<Message, MemoryError> {
        let mut message = Message::new(session_id, role, content, embedding);
        if let Some(source) = source {
            message = message.with_source(source);
        }
        self.store.insert(message.clone()).await?;
        Ok(message)
    }
}
