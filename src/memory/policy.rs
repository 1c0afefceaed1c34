//! How the recency, semantic and knowledge channels are combined.

use std::collections::HashSet;

use serde::Serialize;

use super::store::{Message, ScoredMessage};
use crate::config::Config;
use crate::constants::{
    DEFAULT_CHAT_KNOWLEDGE_TOP_K, DEFAULT_RECENT_WINDOW, DEFAULT_SIMILAR_LIMIT,
    DEFAULT_SIMILARITY_THRESHOLD, MAX_RECENT_WINDOW, MIN_RECENT_WINDOW,
};
use crate::knowledge::SearchHit;

/// A knowledge document retrieved for a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeSnippet {
    pub ingredient: String,
    pub role: String,
    pub summary: String,
    pub evidence: String,
    pub score: f32,
}

impl From<&SearchHit<'_>> for KnowledgeSnippet {
    fn from(hit: &SearchHit<'_>) -> Self {
        Self {
            ingredient: hit.document.ingredient.clone(),
            role: hit.document.role.clone(),
            summary: hit.document.summary.clone(),
            evidence: hit.document.evidence.clone(),
            score: hit.score,
        }
    }
}

/// Everything handed to the generator for one chat turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextBundle {
    /// Oldest first.
    pub recent: Vec<Message>,
    /// Most similar first.
    pub similar: Vec<ScoredMessage>,
    pub knowledge: Vec<KnowledgeSnippet>,
}

/// How much each channel fetches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalPlan {
    pub recent_window: usize,
    pub similar_limit: usize,
    pub similarity_threshold: f32,
    pub knowledge_top_k: usize,
}

impl Default for RetrievalPlan {
    fn default() -> Self {
        Self {
            recent_window: DEFAULT_RECENT_WINDOW,
            similar_limit: DEFAULT_SIMILAR_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            knowledge_top_k: DEFAULT_CHAT_KNOWLEDGE_TOP_K,
        }
    }
}

impl From<&Config> for RetrievalPlan {
    fn from(config: &Config) -> Self {
        Self::default()
            .with_recent_window(config.recent_window)
            .with_similar_limit(config.similar_limit)
            .with_similarity_threshold(config.similarity_threshold)
            .with_knowledge_top_k(config.chat_knowledge_top_k)
    }
}

impl RetrievalPlan {
    /// Clamps the recency window to 6..=10.
    pub fn with_recent_window(mut self, window: usize) -> Self {
        self.recent_window = window.clamp(MIN_RECENT_WINDOW, MAX_RECENT_WINDOW);
        self
    }

    pub fn with_similar_limit(mut self, limit: usize) -> Self {
        self.similar_limit = limit;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_knowledge_top_k(mut self, top_k: usize) -> Self {
        self.knowledge_top_k = top_k;
        self
    }
}

/// Decides what each channel fetches and how the results are combined.
pub trait BlendPolicy: Send + Sync {
    fn plan(&self) -> RetrievalPlan;

    fn blend(
        &self,
        recent: Vec<Message>,
        similar: Vec<ScoredMessage>,
        knowledge: Vec<KnowledgeSnippet>,
    ) -> ContextBundle;
}

/// Concatenates the channels as fetched.
///
/// A message may show up in both the recency and the semantic channel; no
/// deduplication is done.
#[derive(Debug, Clone, Default)]
pub struct RecencySemanticBlend {
    plan: RetrievalPlan,
}

impl RecencySemanticBlend {
    pub fn new(plan: RetrievalPlan) -> Self {
        Self { plan }
    }
}

impl BlendPolicy for RecencySemanticBlend {
    fn plan(&self) -> RetrievalPlan {
        self.plan
    }

    fn blend(
        &self,
        recent: Vec<Message>,
        similar: Vec<ScoredMessage>,
        knowledge: Vec<KnowledgeSnippet>,
    ) -> ContextBundle {
        ContextBundle {
            recent,
            similar,
            knowledge,
        }
    }
}

/// Like [`RecencySemanticBlend`], but drops semantic hits already in the recency window.
#[derive(Debug, Clone, Default)]
pub struct DedupBlend {
    plan: RetrievalPlan,
}

impl DedupBlend {
    pub fn new(plan: RetrievalPlan) -> Self {
        Self { plan }
    }
}

impl BlendPolicy for DedupBlend {
    fn plan(&self) -> RetrievalPlan {
        self.plan
    }

    fn blend(
        &self,
        recent: Vec<Message>,
        similar: Vec<ScoredMessage>,
        knowledge: Vec<KnowledgeSnippet>,
    ) -> ContextBundle {
        let seen: HashSet<_> = recent.iter().map(|m| m.id).collect();
        let similar = similar
            .into_iter()
            .filter(|s| !seen.contains(&s.message.id))
            .collect();
        ContextBundle {
            recent,
            similar,
            knowledge,
        }
    }
}
