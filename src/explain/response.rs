//! Typed parsing of the generator's JSON reply.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One explained ingredient, exactly as the generator must return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplanationItem {
    pub ingredient: String,
    pub role: String,
    pub evidence: String,
    pub explanation: String,
}

impl ExplanationItem {
    /// True when the evidence text flags a risk.
    pub fn needs_caution(&self) -> bool {
        let evidence = self.evidence.to_lowercase();
        evidence.contains("risk") || evidence.contains("unsafe")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExplanationResponse {
    results: Vec<ExplanationItem>,
}

/// Parsed generator output.
///
/// Serializes as a list of items, or as a plain string when the reply could not be
/// decoded and is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Explanation {
    Structured(Vec<ExplanationItem>),
    RawText(String),
}

impl Explanation {
    /// Decodes a reply, falling back to the raw text on any schema violation.
    pub fn parse(reply: &str) -> Self {
        let body = strip_code_fences(reply);
        match serde_json::from_str::<ExplanationResponse>(body) {
            Ok(response) => Self::Structured(response.results),
            Err(e) => {
                warn!(error = %e, reply_len = reply.len(), "Unstructured explanation reply, using raw text");
                Self::RawText(reply.trim().to_string())
            }
        }
    }

    pub fn items(&self) -> &[ExplanationItem] {
        match self {
            Self::Structured(items) => items,
            Self::RawText(_) => &[],
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Chat-ready rendering: one `### name badge` block per item.
    pub fn to_markdown(&self) -> String {
        match self {
            Self::RawText(text) => text.clone(),
            Self::Structured(items) => items
                .iter()
                .map(|item| {
                    let badge = if item.needs_caution() {
                        "⚠️ Caution"
                    } else {
                        "✅ Safe"
                    };
                    format!("### {} {}\n{}", item.ingredient, badge, item.explanation)
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// Returns the body of a Markdown code fence if `text` contains one, else `text` trimmed.
///
/// The info string after the opening fence (`json`, `JSON`, `Json`, ...) is dropped.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let body = &trimmed[open + 3..];
    let info_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let body = &body[info_len..];
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}
