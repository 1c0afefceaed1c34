use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::document::KnowledgeDocument;
use super::error::KnowledgeError;
use super::source::KnowledgeSource;
use crate::embedding::{EmbeddingError, EmbeddingProvider, dot, l2_normalize};

/// One search result: a borrowed corpus document and its cosine similarity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchHit<'a> {
    pub document: &'a KnowledgeDocument,
    pub score: f32,
}

/// Exact (exhaustive) inner-product index over unit-length document vectors.
///
/// Vectors are normalized at build time and queries at search time, so the inner
/// product is cosine similarity. Results are ordered by descending score, with ties
/// going to the earlier corpus entry.
pub struct KnowledgeIndex {
    documents: Vec<KnowledgeDocument>,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for KnowledgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeIndex")
            .field("documents", &self.documents.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl KnowledgeIndex {
    /// Loads, validates and embeds the corpus. Invalid records are skipped with a warning.
    #[instrument(skip(source, embedder))]
    pub async fn build(
        source: &dyn KnowledgeSource,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, KnowledgeError> {
        let records = source.load().await?;
        let total = records.len();

        let documents: Vec<KnowledgeDocument> = records
            .iter()
            .filter_map(|record| match KnowledgeDocument::from_record(record) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!(origin = %record.origin, error = %e, "Rejected knowledge record");
                    None
                }
            })
            .collect();

        let index = Self::from_documents(documents, embedder).await?;

        info!(
            admitted = index.len(),
            rejected = total - index.len(),
            dimensions = index.dimensions,
            "Knowledge index built"
        );
        Ok(index)
    }

    /// Embeds already-validated documents and freezes them into an index.
    pub async fn from_documents(
        mut documents: Vec<KnowledgeDocument>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, KnowledgeError> {
        let dimensions = embedder.dimensions();

        if !documents.is_empty() {
            let texts: Vec<String> = documents.iter().map(|d| d.composed_text()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            check_batch_len(texts.len(), vectors.len())?;

            for (document, mut vector) in documents.iter_mut().zip(vectors) {
                if vector.len() != dimensions {
                    return Err(KnowledgeError::DimensionMismatch {
                        expected: dimensions,
                        actual: vector.len(),
                    });
                }
                l2_normalize(&mut vector);
                document.embedding = vector;
            }
        }

        Ok(Self {
            documents,
            dimensions,
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    /// Top `top_k` documents for `query`.
    ///
    /// Runs through the batch path with a single query, so it is identical to the
    /// corresponding element of [`KnowledgeIndex::search_batch`].
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit<'_>>, KnowledgeError> {
        let mut results = self.search_batch(&[query.to_string()], top_k).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Top `top_k` documents for each query, in query order.
    pub async fn search_batch(
        &self,
        queries: &[String],
        top_k: usize,
    ) -> Result<Vec<Vec<SearchHit<'_>>>, KnowledgeError> {
        if queries.is_empty() {
            return Ok(vec![]);
        }
        if self.is_empty() || top_k == 0 {
            return Ok(queries.iter().map(|_| Vec::new()).collect());
        }

        let vectors = self.embedder.embed_batch(queries).await?;
        check_batch_len(queries.len(), vectors.len())?;
        debug!(
            queries = queries.len(),
            top_k,
            "Searching knowledge index"
        );

        vectors
            .into_iter()
            .map(|mut vector| {
                l2_normalize(&mut vector);
                self.search_vector(&vector, top_k)
            })
            .collect()
    }

    /// Ranks the corpus against an already-normalized query vector.
    pub fn search_vector(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit<'_>>, KnowledgeError> {
        if query.len() != self.dimensions {
            return Err(KnowledgeError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, d)| (i, dot(query, &d.embedding)))
            .collect();

        // Stable order: score desc, then corpus position asc.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                document: &self.documents[i],
                score,
            })
            .collect())
    }
}

fn check_batch_len(expected: usize, actual: usize) -> Result<(), KnowledgeError> {
    if expected != actual {
        return Err(EmbeddingError::BatchSizeMismatch { expected, actual }.into());
    }
    Ok(())
}
