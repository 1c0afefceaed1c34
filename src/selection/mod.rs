//! Confidence-ranked candidate selection.
//!
//! Each candidate is scored by its single best knowledge match. Scoring is batched;
//! if the batch fails the candidates are rescored one by one and only the ones that
//! still fail are dropped.

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::MAX_SELECTED_INGREDIENTS;
use crate::knowledge::{KnowledgeIndex, SearchHit};

/// Generic label terms that never get explained.
pub const DEFAULT_SKIP_WORDS: &[&str] = &[
    "flavouring",
    "added flavour",
    "spices",
    "permitted colour",
    "food colour",
];

/// Lowercase noise terms filtered out before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSet {
    words: HashSet<String>,
}

impl Default for SkipSet {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_WORDS.iter().copied())
    }
}

impl SkipSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// An empty set (nothing is skipped).
    pub fn none() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Case-insensitive whole-name membership.
    pub fn contains(&self, candidate: &str) -> bool {
        self.words.contains(&candidate.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A candidate and the cosine similarity of its nearest knowledge document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub ingredient: String,
    pub score: f32,
}

/// Ranked, bounded selection. Scores are non-increasing; equal scores keep input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedSet {
    items: Vec<ScoredCandidate>,
}

impl SelectedSet {
    pub fn items(&self) -> &[ScoredCandidate] {
        &self.items
    }

    pub fn ingredients(&self) -> Vec<String> {
        self.items.iter().map(|c| c.ingredient.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.items.iter()
    }
}

impl From<Vec<ScoredCandidate>> for SelectedSet {
    fn from(items: Vec<ScoredCandidate>) -> Self {
        Self { items }
    }
}

/// Why a selection came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Normalization produced no candidates.
    NoneExtracted,
    /// Every candidate was in the skip set.
    AllFiltered,
    /// No remaining candidate could be scored against the corpus.
    NoneMatched,
}

impl EmptyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoneExtracted => "none_extracted",
            Self::AllFiltered => "all_filtered",
            Self::NoneMatched => "none_matched",
        }
    }
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected(SelectedSet),
    Empty(EmptyReason),
}

/// Scores candidates against a [`KnowledgeIndex`] and keeps the most confident ones.
#[derive(Debug, Clone)]
pub struct ConfidenceSelector {
    index: Arc<KnowledgeIndex>,
    max_selected: usize,
}

impl ConfidenceSelector {
    pub fn new(index: Arc<KnowledgeIndex>) -> Self {
        Self {
            index,
            max_selected: MAX_SELECTED_INGREDIENTS,
        }
    }

    /// Overrides the selection bound (minimum 1).
    pub fn with_max_selected(mut self, max_selected: usize) -> Self {
        self.max_selected = max_selected.max(1);
        self
    }

    pub fn max_selected(&self) -> usize {
        self.max_selected
    }

    /// Filters, scores, ranks and truncates `candidates`.
    pub async fn select(&self, candidates: &[String], skip: &SkipSet) -> SelectionOutcome {
        if candidates.is_empty() {
            return SelectionOutcome::Empty(EmptyReason::NoneExtracted);
        }

        let kept: Vec<String> = candidates
            .iter()
            .filter(|c| !skip.contains(c))
            .cloned()
            .collect();
        if kept.is_empty() {
            debug!(candidates = candidates.len(), "All candidates filtered as noise");
            return SelectionOutcome::Empty(EmptyReason::AllFiltered);
        }

        let mut scored = self.score(&kept).await;
        if scored.is_empty() {
            return SelectionOutcome::Empty(EmptyReason::NoneMatched);
        }

        // `sort_by` is stable, so equal scores keep candidate order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.max_selected);

        debug!(
            selected = scored.len(),
            filtered = candidates.len() - kept.len(),
            "Selected ingredients"
        );
        SelectionOutcome::Selected(SelectedSet::from(scored))
    }

    /// Best-match score per candidate, in input order. Unscorable candidates are omitted.
    pub async fn score(&self, candidates: &[String]) -> Vec<ScoredCandidate> {
        match self.index.search_batch(candidates, 1).await {
            Ok(results) => candidates
                .iter()
                .zip(results)
                .filter_map(|(candidate, hits)| best(candidate, &hits))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Batch scoring failed, scoring candidates individually");
                self.score_individually(candidates).await
            }
        }
    }

    async fn score_individually(&self, candidates: &[String]) -> Vec<ScoredCandidate> {
        let lookups = candidates.iter().map(|candidate| async move {
            (candidate, self.index.search(candidate, 1).await)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(candidate, result)| match result {
                Ok(hits) => best(candidate, &hits),
                Err(e) => {
                    warn!(ingredient = %candidate, error = %e, "Dropping unscorable candidate");
                    None
                }
            })
            .collect()
    }
}

fn best(candidate: &str, hits: &[SearchHit<'_>]) -> Option<ScoredCandidate> {
    hits.first().map(|hit| ScoredCandidate {
        ingredient: candidate.to_string(),
        score: hit.score,
    })
}
