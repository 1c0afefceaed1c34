//! Explanation pipeline over an on-disk knowledge corpus.

mod common;

use std::sync::Arc;
use std::time::Duration;

use foodlens::{
    AnalysisOutcome, EmptyReason, ExplanationPipeline, FailureReason, MockCompletionProvider,
    SkipSet,
};

use common::{corpus_on_disk, explanation_reply};

const LABEL: &str = "Nutrition facts per 100g\nINGREDIENTS: Sugar, Salt, Spices, Cocoa Powder (12%), Soy Lecithin";

#[tokio::test]
async fn test_corpus_skips_bad_files() {
    let corpus = corpus_on_disk().await;
    assert_eq!(corpus.index.len(), 10);
}

#[tokio::test]
async fn test_label_end_to_end() {
    let corpus = corpus_on_disk().await;
    let completion = Arc::new(MockCompletionProvider::replying(explanation_reply(&[
        "Sugar",
        "Salt",
        "Cocoa Powder",
        "Soy Lecithin",
    ])));
    let pipeline = ExplanationPipeline::new(corpus.index.clone(), completion.clone());

    let outcome = pipeline.analyze(LABEL, "en").await;

    let AnalysisOutcome::Ok {
        mut selected,
        explanations,
    } = outcome
    else {
        panic!("expected ok outcome, got {outcome:?}");
    };
    selected.sort();
    assert_eq!(selected, vec!["Cocoa Powder", "Salt", "Soy Lecithin", "Sugar"]);
    assert_eq!(explanations.items().len(), 4);
    assert!(explanations.to_markdown().contains("### Sugar"));
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_custom_skip_set() {
    let corpus = corpus_on_disk().await;
    let pipeline = ExplanationPipeline::new(
        corpus.index.clone(),
        Arc::new(MockCompletionProvider::new()),
    )
    .with_skip_set(SkipSet::new(["sugar", "salt"]));

    let outcome = pipeline.analyze("Ingredients: Sugar, Salt", "en").await;

    assert_eq!(
        outcome,
        AnalysisOutcome::Empty {
            reason: EmptyReason::AllFiltered
        }
    );
}

#[tokio::test]
async fn test_timeout_outcome_serializes_selection() {
    let corpus = corpus_on_disk().await;
    let completion =
        Arc::new(MockCompletionProvider::replying("late").with_delay(Duration::from_secs(5)));
    let pipeline = ExplanationPipeline::new(corpus.index.clone(), completion)
        .with_generation_timeout(Duration::from_millis(20));

    let outcome = pipeline.analyze("Ingredients: Sugar, Salt", "en").await;
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["status"], "failed");
    assert_eq!(value["reason"], "timeout");
    assert_eq!(value["partial_selected"].as_array().unwrap().len(), 2);
    assert!(matches!(
        outcome,
        AnalysisOutcome::Failed {
            reason: FailureReason::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_analyses_share_one_index() {
    let corpus = corpus_on_disk().await;
    let completion = Arc::new(MockCompletionProvider::replying(explanation_reply(&["Sugar"])));
    let pipeline = Arc::new(ExplanationPipeline::new(
        corpus.index.clone(),
        completion.clone(),
    ));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline.analyze("Ingredients: Sugar, Palm Oil, Citric Acid", "en").await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.expect("task should not panic"));
    }

    assert!(outcomes.iter().all(|o| o.status() == "ok"));
    assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(completion.calls(), 16);
}
