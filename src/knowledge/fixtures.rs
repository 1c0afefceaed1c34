//! Small reference corpus for tests and local runs.

use std::sync::Arc;

use serde_json::{Value, json};

use super::{InMemoryKnowledgeSource, KnowledgeError, KnowledgeIndex};
use crate::embedding::EmbeddingProvider;

/// A well-formed knowledge record.
pub fn record_json(ingredient: &str, role: &str, summary: &str, evidence: &str) -> Value {
    json!({
        "ingredient": ingredient,
        "role": role,
        "summary": summary,
        "evidence": evidence,
        "sources": ["FSSAI food additive schedule", "EFSA scientific opinion"]
    })
}

/// Ten common packaged-food ingredients.
pub fn sample_corpus() -> Vec<Value> {
    vec![
        record_json(
            "Sugar",
            "Sweetener",
            "Refined sucrose that adds sweetness and bulk",
            "Excess intake is a known risk factor for obesity and tooth decay",
        ),
        record_json(
            "Salt",
            "Seasoning and preservative",
            "Sodium chloride used for taste and shelf life",
            "High sodium intake raises blood pressure risk",
        ),
        record_json(
            "Cocoa Powder",
            "Flavouring",
            "Ground cocoa solids that give chocolate flavour",
            "Generally safe and contains flavanols",
        ),
        record_json(
            "Palm Oil",
            "Fat",
            "Vegetable fat used for texture and frying",
            "Mixed evidence on saturated fat and heart health",
        ),
        record_json(
            "Maltodextrin",
            "Thickener",
            "Starch-derived carbohydrate used as a filler",
            "Safe in normal amounts but has a high glycemic index",
        ),
        record_json(
            "Soy Lecithin",
            "Emulsifier",
            "Keeps oil and water mixed in chocolate and spreads",
            "Approved as safe by food regulators",
        ),
        record_json(
            "Citric Acid",
            "Acidity regulator",
            "Adds tartness and helps preserve freshness",
            "Safe at typical intake levels",
        ),
        record_json(
            "Milk Solids",
            "Dairy ingredient",
            "Dried milk components adding creaminess",
            "Safe except for people with milk allergy or lactose intolerance",
        ),
        record_json(
            "Wheat Flour",
            "Base ingredient",
            "Milled wheat providing structure",
            "Safe for most people, unsafe for those with celiac disease",
        ),
        record_json(
            "Sodium Benzoate",
            "Preservative",
            "Prevents mould and yeast growth in acidic foods",
            "Safe within permitted limits",
        ),
    ]
}

/// Builds an index over [`sample_corpus`].
pub async fn sample_index(
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<KnowledgeIndex, KnowledgeError> {
    let source = InMemoryKnowledgeSource::from_values(sample_corpus());
    KnowledgeIndex::build(&source, embedder).await
}
