//! RAG Retriever (§4.3): embeds queries, searches named vector collections,
//! re-ranks, and degrades gracefully on provider failure.

use std::sync::Arc;

use cveval_domain::entities::RetrievedChunk;
use cveval_domain::ports::providers::{EmbeddingProvider, VectorStoreProvider};
use cveval_domain::ports::MetricsProvider;
use cveval_domain::value_objects::CollectionName;

use super::relevance::mean_relevance;
use super::rerank::top_contexts_by_weight;

/// Retrieved context for both named collections (§4.3).
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Context retrieved from the `job_description` collection.
    pub job_description: Vec<RetrievedChunk>,
    /// Context retrieved from the `scoring_rubric` collection.
    pub scoring_rubric: Vec<RetrievedChunk>,
}

/// Drives the retrieval-augmented-generation lookup for a single task.
pub struct RagRetriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    metrics: Arc<dyn MetricsProvider>,
    top_k: usize,
}

impl RagRetriever {
    /// Build a retriever returning up to `top_k` chunks per collection.
    #[must_use]
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        metrics: Arc<dyn MetricsProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embeddings,
            vector_store,
            metrics,
            top_k,
        }
    }

    /// Retrieve both collections' context for a job description and a study case brief.
    ///
    /// Embeds both queries in a single batch call. Any embedding or search
    /// failure degrades to an empty context for the affected collection and
    /// records `rag_retrieval_errors_total`, rather than failing the task.
    pub async fn retrieve(&self, job_description: &str, study_case_brief: &str) -> RetrievedContext {
        let queries = vec![job_description.to_owned(), study_case_brief.to_owned()];
        let embeddings = match self.embeddings.embed_batch(&queries).await {
            Ok(vectors) if vectors.len() == 2 => vectors,
            Ok(_) | Err(_) => {
                self.metrics.record_rag_error("job_description", "embed");
                self.metrics.record_rag_error("scoring_rubric", "embed");
                return RetrievedContext::default();
            }
        };
        let job_description_vector = &embeddings[0];
        let study_case_brief_vector = &embeddings[1];

        let k_ext = self.top_k * 2;
        let job_description_chunks = self
            .search_and_rank(
                CollectionName::JobDescription.as_str(),
                job_description_vector,
                k_ext,
                job_description,
            )
            .await;
        let scoring_rubric_chunks = self
            .search_and_rank(
                CollectionName::ScoringRubric.as_str(),
                study_case_brief_vector,
                k_ext,
                study_case_brief,
            )
            .await;

        RetrievedContext {
            job_description: job_description_chunks,
            scoring_rubric: scoring_rubric_chunks,
        }
    }

    async fn search_and_rank(
        &self,
        collection: &str,
        vector: &[f32],
        k_ext: usize,
        relevance_query: &str,
    ) -> Vec<RetrievedChunk> {
        let hits = match self.vector_store.search(collection, vector, k_ext).await {
            Ok(hits) => hits,
            Err(_) => {
                self.metrics.record_rag_error(collection, "search");
                return Vec::new();
            }
        };
        let ranked = top_contexts_by_weight(hits, self.top_k);
        let effectiveness = mean_relevance(&ranked, relevance_query);
        self.metrics
            .record_rag_effectiveness(collection, "context", effectiveness);
        ranked
    }
}
