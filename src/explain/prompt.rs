//! Prompt assembly for batched, per-ingredient grounded explanations.

use serde::Serialize;

use crate::knowledge::SearchHit;

pub const EXPLAIN_SYSTEM_PROMPT: &str = "You are a strict, grounded AI. Obey the rules exactly.";

const RULES: &str = "\
CRITICAL RULES:
- Use ONLY the information provided below
- DO NOT add outside knowledge
- DO NOT merge ingredients
- Explain EACH ingredient SEPARATELY, using only the context under its own INGREDIENT heading
- If evidence is mixed, state that clearly
- Keep tone calm and consumer-friendly";

const RESPONSE_FORMAT: &str = r#"RETURN STRICT JSON ONLY in this format:

{
  "results": [
    {
      "ingredient": "<name>",
      "role": "<role>",
      "evidence": "<evidence>",
      "explanation": "<short explanation>"
    }
  ]
}"#;

/// One retrieved knowledge entry, copied out of the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub role: String,
    pub evidence: String,
    pub summary: String,
    pub score: f32,
}

/// Retrieved context for exactly one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    pub ingredient: String,
    pub entries: Vec<ContextEntry>,
}

impl ContextBlock {
    pub fn from_hits(ingredient: impl Into<String>, hits: &[SearchHit<'_>]) -> Self {
        Self {
            ingredient: ingredient.into(),
            entries: hits
                .iter()
                .map(|hit| ContextEntry {
                    role: hit.document.role.clone(),
                    evidence: hit.document.evidence.clone(),
                    summary: hit.document.summary.clone(),
                    score: hit.score,
                })
                .collect(),
        }
    }

    /// `### INGREDIENT:` section built from this block's own entries only.
    pub fn render(&self) -> String {
        let mut section = format!("### INGREDIENT: {}", self.ingredient);
        if self.entries.is_empty() {
            section.push_str("\n- No matching context found");
        }
        for entry in &self.entries {
            section.push_str(&format!(
                "\n- Role: {}\n- Evidence: {}\n- Summary: {}",
                entry.role, entry.evidence, entry.summary
            ));
        }
        section
    }
}

/// Display name for a language code, or `None` for the default (English).
///
/// `hi` maps to Hindi; any other non-English code is passed through as given.
pub fn language_name(code: &str) -> Option<String> {
    let code = code.trim();
    let lower = code.to_lowercase();
    let primary = lower.split(['-', '_']).next().unwrap_or_default();

    match primary {
        "" | "en" | "english" => None,
        "hi" | "hindi" => Some("Hindi".to_string()),
        _ => Some(code.to_string()),
    }
}

/// Builds the user prompt for one generation call covering every block.
pub fn build_explain_prompt(blocks: &[ContextBlock], language: &str) -> String {
    let mut rules = RULES.to_string();
    if let Some(name) = language_name(language) {
        rules.push_str(&format!(
            "\n- Write every \"explanation\" value in {name}; keep the JSON keys in English"
        ));
    }

    let context = blocks
        .iter()
        .map(ContextBlock::render)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a food safety assistant.\n\n{rules}\n\n{RESPONSE_FORMAT}\n\nCONTEXT:\n{context}\n"
    )
}
