use std::sync::Arc;

use crate::core::config::settings::{
    MAX_RERANKED_RESULTS, MAX_SIMILARITY_THRESHOLD, MIN_SIMILARITY_THRESHOLD,
};
use crate::core::config::SearchSettings;
use crate::core::errors::PipelineError;
use crate::llm::EmbeddingProvider;
use crate::rag::Document;
use crate::tools::vector_math;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankOptions {
    /// Documents must score strictly above this to survive.
    pub similarity_threshold: f32,
    pub max_results: usize,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: MIN_SIMILARITY_THRESHOLD,
            max_results: MAX_RERANKED_RESULTS,
        }
    }
}

impl RerankOptions {
    /// Pulls the options back inside the hard bounds: threshold in
    /// `[0.5, 1.0]`, cap in `1..=15`.
    pub fn bounded(self) -> Self {
        let similarity_threshold = if self.similarity_threshold.is_nan() {
            MIN_SIMILARITY_THRESHOLD
        } else {
            self.similarity_threshold
                .clamp(MIN_SIMILARITY_THRESHOLD, MAX_SIMILARITY_THRESHOLD)
        };
        Self {
            similarity_threshold,
            max_results: self.max_results.clamp(1, MAX_RERANKED_RESULTS),
        }
    }
}

impl From<&SearchSettings> for RerankOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            similarity_threshold: settings.similarity_threshold,
            max_results: settings.max_results,
        }
    }
}

/// Reorders retrieved documents by embedding similarity to the query.
#[derive(Clone)]
pub struct Reranker {
    embeddings: Arc<dyn EmbeddingProvider>,
    options: RerankOptions,
}

impl Reranker {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, options: RerankOptions) -> Self {
        Self {
            embeddings,
            options: options.bounded(),
        }
    }

    pub fn options(&self) -> RerankOptions {
        self.options
    }

    /// Returns at most `max_results` documents scoring above the threshold,
    /// most similar first.
    ///
    /// Documents with empty content never reach the embedding provider and
    /// never appear in the output. An embedding failure fails the whole call.
    pub async fn rerank(
        &self,
        query: &str,
        docs: Vec<Document>,
    ) -> Result<Vec<Document>, PipelineError> {
        if docs.is_empty() {
            return Ok(docs);
        }

        let total = docs.len();
        let candidates: Vec<Document> = docs.into_iter().filter(Document::has_content).collect();
        if candidates.is_empty() {
            tracing::debug!("Rerank: all {} documents had empty content", total);
            return Ok(Vec::new());
        }

        let texts: Vec<String> = candidates.iter().map(|doc| doc.page_content.clone()).collect();
        let (doc_embeddings, query_embedding) = tokio::try_join!(
            self.embeddings.embed_documents(&texts),
            self.embeddings.embed_query(query),
        )
        .map_err(PipelineError::embedding)?;

        if doc_embeddings.len() != candidates.len() {
            return Err(PipelineError::Embedding(format!(
                "embedding count mismatch: {} != {}",
                doc_embeddings.len(),
                candidates.len()
            )));
        }

        let ranking = vector_math::rank_descending_by_cosine(&query_embedding, &doc_embeddings)?;

        let mut candidates: Vec<Option<Document>> = candidates.into_iter().map(Some).collect();
        let reranked: Vec<Document> = ranking
            .into_iter()
            .filter(|(_, score)| *score > self.options.similarity_threshold)
            .take(self.options.max_results)
            .filter_map(|(idx, _)| candidates.get_mut(idx).and_then(Option::take))
            .collect();

        tracing::debug!(
            "Rerank: {} retrieved, {} with content, {} kept",
            total,
            texts.len(),
            reranked.len()
        );

        Ok(reranked)
    }
}
