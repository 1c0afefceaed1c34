//! Grounded, batched ingredient explanations.
//!
//! Context is retrieved separately for every selected ingredient and rendered as its
//! own prompt section, then the whole batch goes out in one completion call. The reply
//! is decoded into typed [`ExplanationItem`]s, or kept as raw text when it does not
//! match the schema.

mod error;
pub mod prompt;
pub mod response;


pub use error::ExplainError;
pub use prompt::{ContextBlock, ContextEntry, EXPLAIN_SYSTEM_PROMPT, build_explain_prompt};
pub use response::{Explanation, ExplanationItem, strip_code_fences};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::constants::{
    DEFAULT_EXPLAIN_TOP_K, DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};
use crate::knowledge::KnowledgeIndex;

pub struct GroundedExplainer {
    index: Arc<KnowledgeIndex>,
    completion: Arc<dyn CompletionProvider>,
    top_k: usize,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for GroundedExplainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroundedExplainer")
            .field("top_k", &self.top_k)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GroundedExplainer {
    pub fn new(index: Arc<KnowledgeIndex>, completion: Arc<dyn CompletionProvider>) -> Self {
        Self {
            index,
            completion,
            top_k: DEFAULT_EXPLAIN_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One isolated context block per ingredient, in input order.
    pub async fn retrieve_contexts(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<ContextBlock>, ExplainError> {
        let results = self.index.search_batch(ingredients, self.top_k).await?;
        Ok(ingredients
            .iter()
            .zip(results.iter())
            .map(|(ingredient, hits)| ContextBlock::from_hits(ingredient.clone(), hits))
            .collect())
    }

    /// Explains `selected` in a single generation call.
    ///
    /// An empty selection returns an empty result without calling the generator. The
    /// generator may cover fewer ingredients than requested.
    pub async fn explain(
        &self,
        selected: &[String],
        language: &str,
    ) -> Result<Explanation, ExplainError> {
        if selected.is_empty() {
            return Ok(Explanation::Structured(Vec::new()));
        }

        let blocks = self.retrieve_contexts(selected).await?;
        let prompt = build_explain_prompt(&blocks, language);
        debug!(
            ingredients = selected.len(),
            prompt_len = prompt.len(),
            language,
            "Requesting grounded explanations"
        );

        let request = CompletionRequest::new(EXPLAIN_SYSTEM_PROMPT, prompt)
            .with_temperature(self.temperature)
            .with_timeout(self.timeout);
        let reply = self.completion.complete(&request).await?;

        let explanation = Explanation::parse(&reply);
        info!(
            requested = selected.len(),
            explained = explanation.items().len(),
            structured = explanation.is_structured(),
            "Explanations generated"
        );
        Ok(explanation)
    }
}
