use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::*;
use crate::embedding::{EmbeddingProvider, HashedEmbedder};
use crate::knowledge::fixtures::sample_index;

const SESSION: &str = "session-a";

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashedEmbedder::default())
}

fn vectorize(text: &str) -> Vec<f32> {
    HashedEmbedder::default().vectorize(text)
}

async fn memory_with(store: Arc<dyn MessageStore>) -> ConversationMemory {
    let index = sample_index(embedder()).await.expect("sample index");
    ConversationMemory::new(store, embedder(), Arc::new(index))
}

async fn seed(memory: &ConversationMemory, turns: &[&str]) {
    for (i, turn) in turns.iter().enumerate() {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        memory.append(SESSION, role, turn, None).await.unwrap();
    }
}

/// Returns the recency window newest first, like a `created_at DESC` query.
struct NewestFirstStore(InMemoryMessageStore);

#[async_trait]
impl MessageStore for NewestFirstStore {
    async fn insert(&self, message: Message) -> Result<(), MemoryError> {
        self.0.insert(message).await
    }

    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>, MemoryError> {
        let mut messages = self.0.recent(session_id, limit).await?;
        messages.reverse();
        Ok(messages)
    }

    async fn similar(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredMessage>, MemoryError> {
        self.0
            .similar(session_id, query_embedding, threshold, limit)
            .await
    }
}

mod in_memory_store {
    use super::*;

    #[tokio::test]
    async fn test_recent_returns_tail_oldest_first() {
        let store = InMemoryMessageStore::new();
        for i in 0..5 {
            store
                .insert(Message::new(SESSION, Role::User, format!("m{i}"), vec![]))
                .await
                .unwrap();
        }

        let recent = store.recent(SESSION, 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();

        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert_eq!(store.recent(SESSION, 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryMessageStore::new();
        store
            .insert(Message::new("a", Role::User, "sugar", vectorize("sugar")))
            .await
            .unwrap();

        assert!(store.recent("b", 6).await.unwrap().is_empty());
        assert!(
            store
                .similar("b", &vectorize("sugar"), 0.0, 4)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.session_len("a"), 1);
    }

    #[tokio::test]
    async fn test_similar_applies_threshold_and_limit() {
        let store = InMemoryMessageStore::new();
        for text in [
            "is sugar safe",
            "is sugar safe",
            "is sugar safe",
            "tell me about palm oil",
        ] {
            store
                .insert(Message::new(SESSION, Role::User, text, vectorize(text)))
                .await
                .unwrap();
        }
        store
            .insert(Message::new(SESSION, Role::User, "is sugar safe", vec![]))
            .await
            .unwrap();

        let hits = store
            .similar(SESSION, &vectorize("is sugar safe"), 0.78, 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.message.content == "is sugar safe"));
        assert!(hits.iter().all(|h| (h.score - 1.0).abs() < 1e-5));
    }

    #[tokio::test]
    async fn test_similar_orders_by_score() {
        let store = InMemoryMessageStore::new();
        for text in ["sugar", "sugar and salt", "sugar salt and palm oil"] {
            store
                .insert(Message::new(SESSION, Role::User, text, vectorize(text)))
                .await
                .unwrap();
        }

        let hits = store
            .similar(SESSION, &vectorize("sugar"), -1.0, 10)
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].message.content, "sugar");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_session_does_not_block_others() {
        let store = Arc::new(InMemoryMessageStore::new());
        store
            .insert(Message::new("a", Role::User, "sugar", vectorize("sugar")))
            .await
            .unwrap();

        let busy = store.session("a").unwrap();
        let _guard = busy.write();

        let other = store.clone();
        let task = tokio::spawn(async move {
            other
                .insert(Message::new("b", Role::User, "salt", vectorize("salt")))
                .await?;
            let recent = other.recent("b", 6).await?;
            let similar = other.similar("b", &vectorize("salt"), 0.5, 4).await?;
            Ok::<_, MemoryError>((recent.len(), similar.len()))
        });

        let counts = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("other sessions must not wait on a busy one")
            .unwrap()
            .unwrap();
        assert_eq!(counts, (1, 1));
    }

    #[test]
    fn test_message_serialization_omits_embedding() {
        let message = Message::new(SESSION, Role::Assistant, "hi", vec![1.0, 0.0]).with_source("rag");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["role"], "assistant");
        assert_eq!(value["source"], "rag");
        assert!(value.get("embedding").is_none());
    }
}

mod plans {
    use super::*;

    #[test]
    fn test_default_plan() {
        let plan = RetrievalPlan::default();
        assert_eq!(plan.recent_window, 6);
        assert_eq!(plan.similar_limit, 4);
        assert_eq!(plan.knowledge_top_k, 4);
        assert!((plan.similarity_threshold - 0.78).abs() < f32::EPSILON);
    }

    #[test]
    fn test_plan_from_config() {
        let config = crate::config::Config {
            recent_window: 8,
            similar_limit: 2,
            similarity_threshold: 0.5,
            chat_knowledge_top_k: 3,
            ..Default::default()
        };

        let plan = RetrievalPlan::from(&config);

        assert_eq!(plan.recent_window, 8);
        assert_eq!(plan.similar_limit, 2);
        assert_eq!(plan.knowledge_top_k, 3);
        assert!((plan.similarity_threshold - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_recent_window_clamped() {
        assert_eq!(RetrievalPlan::default().with_recent_window(1).recent_window, 6);
        assert_eq!(RetrievalPlan::default().with_recent_window(8).recent_window, 8);
        assert_eq!(RetrievalPlan::default().with_recent_window(99).recent_window, 10);
    }
}

mod conversation {
    use super::*;

    #[tokio::test]
    async fn test_append_stores_embedding_and_source() {
        let store = Arc::new(InMemoryMessageStore::new());
        let memory = memory_with(store.clone()).await;

        let message = memory
            .append(SESSION, Role::Assistant, "Sugar is fine in moderation", Some("rag"))
            .await
            .unwrap();

        let history = store.history(SESSION);
        assert_eq!(history, vec![message.clone()]);
        assert_eq!(message.embedding, vectorize("Sugar is fine in moderation"));
        assert_eq!(message.source.as_deref(), Some("rag"));
    }

    #[tokio::test]
    async fn test_recency_window_is_last_six_in_order() {
        let memory = memory_with(Arc::new(InMemoryMessageStore::new())).await;
        let turns = ["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7"];
        seed(&memory, &turns).await;

        let bundle = memory.build_context(SESSION, "what about salt").await.unwrap();

        let contents: Vec<_> = bundle.recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["t2", "t3", "t4", "t5", "t6", "t7"]);
    }

    #[tokio::test]
    async fn test_recency_window_reordered_chronologically() {
        let memory = memory_with(Arc::new(NewestFirstStore(InMemoryMessageStore::new()))).await;
        let base = Utc::now();
        for i in 0..4 {
            let message = Message::new(SESSION, Role::User, format!("t{i}"), vec![])
                .with_created_at(base + Duration::seconds(i));
            memory.store().insert(message).await.unwrap();
        }

        let bundle = memory.build_context(SESSION, "anything").await.unwrap();

        let contents: Vec<_> = bundle.recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["t0", "t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_semantic_channel_reaches_past_the_window() {
        let memory = memory_with(Arc::new(InMemoryMessageStore::new())).await;
        let mut turns = vec!["is palm oil bad for my heart"];
        turns.extend(["ok", "thanks", "hmm", "right", "sure", "fine", "yes"]);
        seed(&memory, &turns).await;

        let bundle = memory
            .build_context(SESSION, "is palm oil bad for my heart")
            .await
            .unwrap();

        assert!(bundle.recent.iter().all(|m| m.content != turns[0]));
        assert_eq!(bundle.similar.len(), 1);
        assert_eq!(bundle.similar[0].message.content, turns[0]);
    }

    #[tokio::test]
    async fn test_channels_are_not_deduplicated() {
        let memory = memory_with(Arc::new(InMemoryMessageStore::new())).await;
        seed(&memory, &["is sugar safe for kids"]).await;

        let bundle = memory
            .build_context(SESSION, "is sugar safe for kids")
            .await
            .unwrap();

        assert_eq!(bundle.recent.len(), 1);
        assert_eq!(bundle.similar.len(), 1);
        assert_eq!(bundle.recent[0].id, bundle.similar[0].message.id);
    }

    #[tokio::test]
    async fn test_dedup_policy_drops_overlap() {
        let memory = memory_with(Arc::new(InMemoryMessageStore::new()))
            .await
            .with_policy(Arc::new(DedupBlend::default()));
        seed(&memory, &["is sugar safe for kids"]).await;

        let bundle = memory
            .build_context(SESSION, "is sugar safe for kids")
            .await
            .unwrap();

        assert_eq!(bundle.recent.len(), 1);
        assert!(bundle.similar.is_empty());
    }

    #[tokio::test]
    async fn test_knowledge_channel_follows_plan() {
        let memory = memory_with(Arc::new(InMemoryMessageStore::new()))
            .await
            .with_policy(Arc::new(RecencySemanticBlend::new(
                RetrievalPlan::default().with_knowledge_top_k(3),
            )));

        let bundle = memory
            .build_context(SESSION, "Is palm oil bad for the heart?")
            .await
            .unwrap();

        assert_eq!(bundle.knowledge.len(), 3);
        assert_eq!(bundle.knowledge[0].ingredient, "Palm Oil");
        assert!(bundle.recent.is_empty());
        assert!(bundle.similar.is_empty());
    }
}
