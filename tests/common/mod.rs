//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use foodlens::knowledge::fixtures::sample_corpus;
use foodlens::{
    DirectoryKnowledgeSource, EmbeddingProvider, ExplanationItem, HashedEmbedder, KnowledgeIndex,
};

/// A knowledge directory on disk plus the index built from it.
pub struct Corpus {
    pub dir: TempDir,
    pub index: Arc<KnowledgeIndex>,
}

/// Writes the sample corpus as one file per record, plus one broken file and one
/// incomplete record, then indexes the directory.
pub async fn corpus_on_disk() -> Corpus {
    let dir = tempfile::tempdir().expect("temp dir");

    for (i, record) in sample_corpus().into_iter().enumerate() {
        fs::write(dir.path().join(format!("{i:02}.json")), record.to_string())
            .expect("write record");
    }
    fs::write(dir.path().join("broken.json"), "{ \"ingredient\": ").expect("write broken");
    fs::write(
        dir.path().join("partial.json"),
        json!({ "ingredient": "Mystery Powder", "role": "Unknown" }).to_string(),
    )
    .expect("write partial");

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashedEmbedder::default());
    let index = KnowledgeIndex::build(&DirectoryKnowledgeSource::new(dir.path()), embedder)
        .await
        .expect("index should build");

    Corpus {
        dir,
        index: Arc::new(index),
    }
}

pub fn explanation_reply(names: &[&str]) -> String {
    let results: Vec<ExplanationItem> = names
        .iter()
        .map(|name| ExplanationItem {
            ingredient: name.to_string(),
            role: "role".to_string(),
            evidence: "evidence".to_string(),
            explanation: format!("{name} explained"),
        })
        .collect();
    json!({ "results": results }).to_string()
}
