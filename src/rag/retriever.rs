use std::sync::Arc;

use super::document::Document;
use crate::core::errors::PipelineError;
use crate::tools::search::{SearchOptions, SearchProvider};

/// Turns a search query into documents, one per search hit.
#[derive(Clone)]
pub struct DocumentRetriever {
    provider: Arc<dyn SearchProvider>,
}

impl DocumentRetriever {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Hits without a snippet are kept with empty content; the reranker
    /// discards them later. Order follows the search backend.
    pub async fn retrieve(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Document>, PipelineError> {
        let response = self
            .provider
            .search(query, options)
            .await
            .map_err(PipelineError::retrieval)?;

        tracing::debug!(
            "Retrieved {} results from {} for query {:?}",
            response.results.len(),
            self.provider.name(),
            query
        );

        Ok(response.results.into_iter().map(Document::from).collect())
    }
}
