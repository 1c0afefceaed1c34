use std::sync::Arc;

use super::*;
use crate::embedding::{EmbeddingProvider, HashedEmbedder, MockEmbedder};
use crate::knowledge::fixtures::sample_index;
use crate::knowledge::{InMemoryKnowledgeSource, KnowledgeIndex};
use crate::normalize::normalize;

async fn selector_with(embedder: Arc<dyn EmbeddingProvider>) -> ConfidenceSelector {
    let index = sample_index(embedder).await.expect("sample index");
    ConfidenceSelector::new(Arc::new(index))
}

async fn selector() -> ConfidenceSelector {
    selector_with(Arc::new(HashedEmbedder::default())).await
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn expect_selected(outcome: SelectionOutcome) -> SelectedSet {
    match outcome {
        SelectionOutcome::Selected(set) => set,
        other => panic!("expected a selection, got {other:?}"),
    }
}

fn assert_non_increasing(set: &SelectedSet) {
    assert!(
        set.items().windows(2).all(|w| w[0].score >= w[1].score),
        "scores not ordered: {:?}",
        set.items()
    );
}

#[test]
fn test_skip_set_is_case_insensitive() {
    let skip = SkipSet::default();

    assert_eq!(skip.len(), 5);
    assert!(skip.contains("Spices"));
    assert!(skip.contains("FOOD COLOUR"));
    assert!(!skip.contains("Sugar"));
    assert!(!SkipSet::none().contains("spices"));
}

#[test]
fn test_empty_reason_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&EmptyReason::NoneMatched).unwrap(),
        "\"none_matched\""
    );
    assert_eq!(EmptyReason::AllFiltered.to_string(), "all_filtered");
}

#[tokio::test]
async fn test_no_candidates_is_none_extracted() {
    let outcome = selector().await.select(&[], &SkipSet::default()).await;
    assert_eq!(outcome, SelectionOutcome::Empty(EmptyReason::NoneExtracted));
}

#[tokio::test]
async fn test_all_skipped_is_all_filtered() {
    let outcome = selector()
        .await
        .select(&names(&["Spices", "Food Colour"]), &SkipSet::default())
        .await;
    assert_eq!(outcome, SelectionOutcome::Empty(EmptyReason::AllFiltered));
}

#[tokio::test]
async fn test_empty_index_is_none_matched() {
    let index = KnowledgeIndex::build(
        &InMemoryKnowledgeSource::default(),
        Arc::new(HashedEmbedder::default()),
    )
    .await
    .unwrap();
    let selector = ConfidenceSelector::new(Arc::new(index));

    let outcome = selector
        .select(&names(&["Sugar", "Salt"]), &SkipSet::default())
        .await;
    assert_eq!(outcome, SelectionOutcome::Empty(EmptyReason::NoneMatched));
}

#[tokio::test]
async fn test_scenario_filters_spices() {
    let candidates = normalize("INGREDIENTS: Sugar, Salt, Spices, Cocoa Powder");

    let set = expect_selected(selector().await.select(&candidates, &SkipSet::default()).await);

    let mut selected = set.ingredients();
    selected.sort();
    assert_eq!(selected, names(&["Cocoa Powder", "Salt", "Sugar"]));
    assert_non_increasing(&set);
}

#[tokio::test]
async fn test_selection_is_bounded_and_ordered() {
    let candidates = names(&[
        "Sugar",
        "Salt",
        "Cocoa Powder",
        "Palm Oil",
        "Maltodextrin",
        "Soy Lecithin",
        "Citric Acid",
        "Milk Solids",
        "Wheat Flour",
    ]);

    let set = expect_selected(selector().await.select(&candidates, &SkipSet::none()).await);

    assert_eq!(set.len(), 6);
    assert_non_increasing(&set);
}

#[tokio::test]
async fn test_custom_bound() {
    let selector = selector().await.with_max_selected(2);
    let set = expect_selected(
        selector
            .select(&names(&["Sugar", "Salt", "Palm Oil"]), &SkipSet::none())
            .await,
    );
    assert_eq!(set.len(), 2);
    assert_eq!(selector.max_selected(), 2);
}

#[tokio::test]
async fn test_confident_match_ranks_first() {
    let set = expect_selected(
        selector()
            .await
            .select(
                &names(&["Zorblat Quux", "Refined Sugar Sweetener"]),
                &SkipSet::none(),
            )
            .await,
    );

    assert_eq!(set.items()[0].ingredient, "Refined Sugar Sweetener");
}

#[tokio::test]
async fn test_equal_scores_keep_candidate_order() {
    // Same token bag, so the hashed embedder gives both the same vector.
    let selector = selector().await;

    let forward = expect_selected(
        selector
            .select(&names(&["Salt Sugar", "Sugar Salt"]), &SkipSet::none())
            .await,
    );
    let backward = expect_selected(
        selector
            .select(&names(&["Sugar Salt", "Salt Sugar"]), &SkipSet::none())
            .await,
    );

    assert_eq!(forward.ingredients(), names(&["Salt Sugar", "Sugar Salt"]));
    assert_eq!(backward.ingredients(), names(&["Sugar Salt", "Salt Sugar"]));
}

#[tokio::test]
async fn test_failed_batch_drops_only_failing_candidates() {
    let embedder = Arc::new(MockEmbedder::new().failing_on(["glitch"]));
    let selector = selector_with(embedder.clone()).await;

    let set = expect_selected(
        selector
            .select(&names(&["Sugar", "Glitch Gum", "Salt"]), &SkipSet::none())
            .await,
    );

    let mut selected = set.ingredients();
    selected.sort();
    assert_eq!(selected, names(&["Salt", "Sugar"]));
    // build + failed batch + three individual lookups
    assert_eq!(embedder.batch_calls(), 5);
}

#[tokio::test]
async fn test_every_lookup_failing_is_none_matched() {
    let embedder = Arc::new(MockEmbedder::new().failing_on(["glitch"]));
    let selector = selector_with(embedder).await;

    let outcome = selector
        .select(&names(&["Glitch One", "Glitch Two"]), &SkipSet::none())
        .await;
    assert_eq!(outcome, SelectionOutcome::Empty(EmptyReason::NoneMatched));
}
