//! Word lists driving candidate extraction.

/// Terms whose presence marks anchor-less text as an ingredient list.
pub const FOOD_TERMS: &[&str] = &[
    "sugar",
    "salt",
    "flour",
    "oil",
    "milk",
    "egg",
    "butter",
    "wheat",
    "cocoa",
    "starch",
    "syrup",
    "flavour",
    "flavor",
    "protein",
    "fat",
    "carbohydrate",
    "vitamin",
    "acid",
    "water",
    "corn",
    "soy",
    "nut",
    "fruit",
    "juice",
    "extract",
    "ghee",
    "masala",
];

/// Common OCR misreads. A key found anywhere in a fragment replaces the whole fragment.
pub const CORRECTIONS: &[(&str, &str)] = &[
    ("sait", "Salt"),
    ("fron", "Iron"),
    ("lee niacin", "Niacin"),
    ("butter oil a", "Butter Oil"),
    ("fatrecuced", "Fat Reduced"),
    ("nergy", "Energy"),
];

/// Nutrition-panel words stripped out of fragments.
pub const STOPWORDS: &[&str] = &["typical", "value", "nutrition", "energy", "protein"];

/// Lexicons used by [`super::CandidateNormalizer`].
///
/// Entries are matched against lowercase text, so keys and terms must be lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    pub food_terms: Vec<String>,
    /// Checked in order; the first hit wins.
    pub corrections: Vec<(String, String)>,
    pub stopwords: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            food_terms: FOOD_TERMS.iter().map(|s| s.to_string()).collect(),
            corrections: CORRECTIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Lexicon {
    pub fn mentions_food(&self, lowercase_text: &str) -> bool {
        self.food_terms
            .iter()
            .any(|term| lowercase_text.contains(term.as_str()))
    }

    pub fn correction_for(&self, lowercase_name: &str) -> Option<&str> {
        self.corrections
            .iter()
            .find(|(misread, _)| lowercase_name.contains(misread.as_str()))
            .map(|(_, canonical)| canonical.as_str())
    }

    pub fn strip_stopwords(&self, lowercase_name: &str) -> String {
        self.stopwords
            .iter()
            .fold(lowercase_name.to_string(), |name, word| {
                name.replace(word.as_str(), "")
            })
    }
}
