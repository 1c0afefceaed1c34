use std::sync::Arc;

use super::*;

mod vector_math {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_untouched() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_dot_mismatched_lengths() {
        assert_eq!(dot(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }
}

mod hashed {
    use super::*;

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert!(HashedEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_identical_text_identical_vector() {
        let embedder = HashedEmbedder::default();
        let a = embedder.embed("Cocoa Powder").await.unwrap();
        let b = embedder.embed("Cocoa Powder").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), embedder.dimensions());
    }

    #[tokio::test]
    async fn test_case_insensitive_tokens() {
        let embedder = HashedEmbedder::new(64).unwrap();
        let a = embedder.embed("SUGAR").await.unwrap();
        let b = embedder.embed("sugar").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_tokens_score_higher() {
        let embedder = HashedEmbedder::default();
        let query = embedder.embed("cocoa").await.unwrap();
        let related = embedder.embed("cocoa powder flavour").await.unwrap();
        let unrelated = embedder.embed("sodium benzoate").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashedEmbedder::default();
        let texts = vec!["Salt".to_string(), "Palm Oil".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        for (text, vector) in texts.iter().zip(batch.iter()) {
            assert_eq!(&embedder.embed(text).await.unwrap(), vector);
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashedEmbedder::new(16).unwrap();
        let v = embedder.embed("  ,, ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}

mod cached {
    use super::*;

    #[tokio::test]
    async fn test_repeated_embed_hits_cache() {
        let inner = Arc::new(MockEmbedder::new());
        let cached = CachedEmbedder::new(inner.clone());

        let first = cached.embed("Sugar").await.unwrap();
        let second = cached.embed("Sugar").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.embed_calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_only_embeds_misses() {
        let inner = Arc::new(MockEmbedder::new());
        let cached = CachedEmbedder::new(inner.clone());

        cached.embed("Sugar").await.unwrap();
        let texts = vec!["Sugar".to_string(), "Salt".to_string()];
        let batch = cached.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], cached.embed("Sugar").await.unwrap());
        assert_eq!(batch[1], HashedEmbedder::default().vectorize("Salt"));
        assert_eq!(inner.batch_calls(), 1);
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(MockEmbedder::new().failing_on(["msg"]));
        let cached = CachedEmbedder::new(inner.clone());

        assert!(cached.embed("MSG").await.is_err());
        assert!(cached.is_empty());
    }
}

mod mock {
    use super::*;

    #[tokio::test]
    async fn test_failing_batches() {
        let embedder = MockEmbedder::new().failing_batches();
        assert!(embedder.embed_batch(&["Salt".to_string()]).await.is_err());
        assert!(embedder.embed("Salt").await.is_ok());
    }
}
