//! Turns noisy OCR text into clean, deduplicated ingredient names.
//!
//! Normalization never fails: empty input, or text that neither carries an
//! `ingredients` anchor nor mentions a known food term, yields an empty list.

pub mod lexicon;


pub use lexicon::Lexicon;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::constants::{MAX_CANDIDATE_LEN, MIN_CANDIDATE_LEN};

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)ingredients[:\-]?(.*)").expect("unreachable error: invalid anchor pattern")
});
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]").expect("unreachable error: invalid separator pattern"));
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([^)]*\)").expect("unreachable error: invalid parenthetical pattern")
});
static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("unreachable error: invalid symbol pattern"));

/// Extracts candidate ingredient names from raw text.
#[derive(Debug, Clone, Default)]
pub struct CandidateNormalizer {
    lexicon: Lexicon,
}

impl CandidateNormalizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Returns candidates in first-seen order. Every entry is title-cased, free of
    /// duplicates, and strictly between 2 and 40 characters long.
    pub fn normalize(&self, raw_text: &str) -> Vec<String> {
        let lower = raw_text.to_lowercase();

        let working = match ANCHOR.captures(&lower).and_then(|c| c.get(1)) {
            Some(rest) => rest.as_str(),
            None if self.lexicon.mentions_food(&lower) => lower.as_str(),
            None => {
                debug!("No ingredient anchor or food terms found");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let candidates: Vec<String> = SEPARATORS
            .split(working)
            .map(clean_fragment)
            .filter(|f| within_bounds(f))
            .map(|f| self.canonicalize(&f))
            .filter(|c| within_bounds(c))
            .filter(|c| seen.insert(c.clone()))
            .collect();

        debug!(count = candidates.len(), "Normalized ingredient candidates");
        candidates
    }

    fn canonicalize(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        if let Some(canonical) = self.lexicon.correction_for(&lower) {
            return canonical.to_string();
        }
        title_case(&self.lexicon.strip_stopwords(&lower))
    }
}

/// Normalizes with the built-in lexicon.
pub fn normalize(raw_text: &str) -> Vec<String> {
    CandidateNormalizer::default().normalize(raw_text)
}

fn clean_fragment(fragment: &str) -> String {
    let without_notes = PARENTHETICAL.replace_all(fragment, "");
    let letters_only = NON_ALPHA.replace_all(&without_notes, "");
    title_case(&letters_only)
}

fn within_bounds(candidate: &str) -> bool {
    let len = candidate.chars().count();
    len > MIN_CANDIDATE_LEN && len < MAX_CANDIDATE_LEN
}

/// Collapses runs of whitespace and upper-cases the first letter of each word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
