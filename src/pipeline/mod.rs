//! End-to-end explanation pipeline: raw OCR text in, tagged outcome out.
//!
//! Every input produces an [`AnalysisOutcome`]; empty-but-valid input and generation
//! failures are reported as outcomes rather than errors. With a [`ConversationMemory`]
//! attached, [`ExplanationPipeline::analyze_in_session`] also records the scan and its
//! rendered result so follow-up chat turns in the same session can refer to it.


use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::completion::CompletionProvider;
use crate::config::Config;
use crate::explain::prompt::language_name;
use crate::explain::{ExplainError, Explanation, GroundedExplainer};
use crate::knowledge::KnowledgeIndex;
use crate::memory::{ConversationMemory, Role};
use crate::normalize::CandidateNormalizer;
use crate::selection::{ConfidenceSelector, EmptyReason, SelectionOutcome, SkipSet};

/// Language used when the caller does not ask for one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Source tag of the user turn recorded for a scanned label.
pub const UPLOAD_SOURCE: &str = "image_upload";

/// Source tag of the assistant turn holding the rendered analysis.
pub const ANALYSIS_SOURCE: &str = "analysis_result";

const UPLOAD_NOTE: &str = "Label uploaded for analysis";

const FOLLOW_UP_EN: &str = "**Do you want to know more about any of these? Just ask!**";
const FOLLOW_UP_HI: &str = "**क्या आप इनमें से किसी के बारे में और जानना चाहते हैं? बस पूछें!**";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The generation call exceeded its timeout.
    Timeout,
    /// The generation call failed for any other reason.
    Generation,
    /// Per-ingredient context could not be retrieved.
    Retrieval,
}

impl From<&ExplainError> for FailureReason {
    fn from(e: &ExplainError) -> Self {
        match e {
            ExplainError::Retrieval(_) => Self::Retrieval,
            e if e.is_timeout() => Self::Timeout,
            ExplainError::Completion(_) => Self::Generation,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Generation => "generation",
            Self::Retrieval => "retrieval",
        })
    }
}

/// Result of one analysis, serialized with a `status` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    NoText,
    Empty {
        reason: EmptyReason,
    },
    Ok {
        selected: Vec<String>,
        explanations: Explanation,
    },
    /// Carries the selection so the caller can retry or report it.
    Failed {
        reason: FailureReason,
        partial_selected: Vec<String>,
    },
}

impl AnalysisOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::NoText => "no_text",
            Self::Empty { .. } => "empty",
            Self::Ok { .. } => "ok",
            Self::Failed { .. } => "failed",
        }
    }

    /// Markdown shown to the user and stored as the assistant turn of a scan.
    ///
    /// Structured explanations end with a follow-up prompt in the requested language.
    pub fn to_chat_markdown(&self, language: &str) -> String {
        let hindi = language_name(language).as_deref() == Some("Hindi");
        let localized = |en: &str, hi: &str| (if hindi { hi } else { en }).to_string();

        match self {
            Self::Ok {
                explanations: explanations @ Explanation::Structured(_),
                ..
            } => format!(
                "{}\n\n{}",
                explanations.to_markdown(),
                localized(FOLLOW_UP_EN, FOLLOW_UP_HI)
            ),
            Self::Ok { explanations, .. } => explanations.to_markdown(),
            Self::NoText => localized(
                "Please try again with a better quality image.",
                "कृपया थोड़ी बेहतर गुणवत्ता वाली इमेज के साथ पुनः प्रयास करें।",
            ),
            Self::Empty { .. } => localized(
                "No recognizable ingredients found.",
                "कोई पहचान योग्य सामग्री नहीं मिली।",
            ),
            Self::Failed { .. } => localized(
                "The analysis could not be completed. Please try again.",
                "विश्लेषण पूरा नहीं हो सका। कृपया पुनः प्रयास करें।",
            ),
        }
    }
}

pub struct ExplanationPipeline {
    normalizer: CandidateNormalizer,
    skip: SkipSet,
    selector: ConfidenceSelector,
    explainer: GroundedExplainer,
    memory: Option<Arc<ConversationMemory>>,
}

impl fmt::Debug for ExplanationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationPipeline")
            .field("skip", &self.skip)
            .field("selector", &self.selector)
            .field("explainer", &self.explainer)
            .field("records_sessions", &self.memory.is_some())
            .finish()
    }
}

impl ExplanationPipeline {
    pub fn new(index: Arc<KnowledgeIndex>, completion: Arc<dyn CompletionProvider>) -> Self {
        Self {
            normalizer: CandidateNormalizer::default(),
            skip: SkipSet::default(),
            selector: ConfidenceSelector::new(index.clone()),
            explainer: GroundedExplainer::new(index, completion),
            memory: None,
        }
    }

    /// Pipeline with selection and generation settings taken from `config`.
    pub fn from_config(
        config: &Config,
        index: Arc<KnowledgeIndex>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        let mut pipeline = Self::new(index, completion)
            .with_generation_timeout(config.generation_timeout);
        pipeline.selector = pipeline.selector.with_max_selected(config.max_selected);
        pipeline.explainer = pipeline
            .explainer
            .with_top_k(config.explain_top_k)
            .with_temperature(config.temperature);
        pipeline
    }

    pub fn with_skip_set(mut self, skip: SkipSet) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_normalizer(mut self, normalizer: CandidateNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Memory that [`Self::analyze_in_session`] records scans into.
    pub fn with_memory(mut self, memory: Arc<ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.explainer = self.explainer.with_timeout(timeout);
        self
    }

    /// Normalizes, selects and explains.
    #[instrument(skip(self, raw_text), fields(text_len = raw_text.len()))]
    pub async fn analyze(&self, raw_text: &str, language: &str) -> AnalysisOutcome {
        if raw_text.trim().is_empty() {
            return AnalysisOutcome::NoText;
        }

        let candidates = self.normalizer.normalize(raw_text);
        let selected = match self.selector.select(&candidates, &self.skip).await {
            SelectionOutcome::Selected(set) => set.ingredients(),
            SelectionOutcome::Empty(reason) => {
                info!(%reason, candidates = candidates.len(), "Nothing to explain");
                return AnalysisOutcome::Empty { reason };
            }
        };

        match self.explainer.explain(&selected, language).await {
            Ok(explanations) => {
                info!(
                    candidates = candidates.len(),
                    selected = selected.len(),
                    "Analysis complete"
                );
                AnalysisOutcome::Ok {
                    selected,
                    explanations,
                }
            }
            Err(e) => {
                let reason = FailureReason::from(&e);
                warn!(%reason, error = %e, "Explanation failed");
                AnalysisOutcome::Failed {
                    reason,
                    partial_selected: selected,
                }
            }
        }
    }

    /// Runs [`Self::analyze`] and records the scan as two turns of `session_id`.
    ///
    /// The user turn is stored before analysis and the rendered outcome after it.
    /// Without attached memory this is plain [`Self::analyze`]. Storage failures are
    /// logged and never change the outcome.
    pub async fn analyze_in_session(
        &self,
        session_id: &str,
        raw_text: &str,
        language: &str,
    ) -> AnalysisOutcome {
        self.record(session_id, Role::User, UPLOAD_NOTE, UPLOAD_SOURCE)
            .await;

        let outcome = self.analyze(raw_text, language).await;

        self.record(
            session_id,
            Role::Assistant,
            &outcome.to_chat_markdown(language),
            ANALYSIS_SOURCE,
        )
        .await;
        outcome
    }

    async fn record(&self, session_id: &str, role: Role, content: &str, source: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        if let Err(e) = memory.append(session_id, role, content, Some(source)).await {
            warn!(session_id, %role, source, error = %e, "Failed to record analysis turn");
        }
    }
}
