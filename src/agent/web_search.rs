use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use super::generator::AnswerGenerator;
use super::rewriter::QueryRewriter;
use crate::core::config::{LlmSettings, SearchSettings};
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, EmbeddingProvider, LlmProvider};
use crate::rag::{assemble_context, DocumentRetriever};
use crate::stream::{EventRouter, PipelineEvent, SearchStream};
use crate::tools::reranker::{RerankOptions, Reranker};
use crate::tools::search::{SearchOptions, SearchProvider};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Answers one web-search question at a time per call, streaming events back.
///
/// Holds only shared read-only provider handles; every `handle` call gets
/// its own channels and router.
pub struct WebSearchAgent {
    rewriter: Option<QueryRewriter>,
    retriever: DocumentRetriever,
    reranker: Reranker,
    generator: AnswerGenerator,
    search: SearchSettings,
}

impl WebSearchAgent {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embeddings: Arc<dyn EmbeddingProvider>,
        search_provider: Arc<dyn SearchProvider>,
        llm_settings: LlmSettings,
        search: SearchSettings,
    ) -> Self {
        let rewriter = search
            .rewrite_query
            .then(|| QueryRewriter::new(llm.clone(), llm_settings.clone()));

        Self {
            rewriter,
            retriever: DocumentRetriever::new(search_provider),
            reranker: Reranker::new(embeddings, RerankOptions::from(&search)),
            generator: AnswerGenerator::new(llm, llm_settings),
            search,
        }
    }

    pub fn search_settings(&self) -> &SearchSettings {
        &self.search
    }

    /// Starts the pipeline in the background and returns its event stream.
    /// Never fails: problems surface as a single `error` event.
    pub fn handle(self: &Arc<Self>, query: String, history: Vec<ChatMessage>) -> SearchStream {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("web_search", request_id = %request_id);

        let (pipeline_tx, pipeline_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (client_tx, client_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let agent = Arc::clone(self);
        tokio::spawn(
            async move { agent.run_pipeline(&query, &history, pipeline_tx).await }
                .instrument(span.clone()),
        );
        tokio::spawn(EventRouter::new().run(pipeline_rx, client_tx).instrument(span));

        SearchStream::new(client_rx)
    }

    async fn run_pipeline(
        &self,
        query: &str,
        history: &[ChatMessage],
        events: mpsc::Sender<PipelineEvent>,
    ) {
        if let Err(err) = self.answer(query, history, &events).await {
            tracing::error!(stage = err.stage(), error = %err, "Error in websearch");
            let _ = events.send(PipelineEvent::Failed(err)).await;
        }
    }

    async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
        events: &mpsc::Sender<PipelineEvent>,
    ) -> Result<(), PipelineError> {
        let search_query = match &self.rewriter {
            Some(rewriter) => rewriter.rewrite(history, query).await?,
            None => query.to_string(),
        };

        let options = SearchOptions {
            language: self.search.language.clone(),
        };
        let retrieved = self.retriever.retrieve(&search_query, &options).await?;
        let sources = self.reranker.rerank(&search_query, retrieved).await?;
        let context = assemble_context(&sources);

        tracing::info!(query = %search_query, sources = sources.len(), "Sources ready");
        if events.send(PipelineEvent::SourcesRetrieved(sources)).await.is_err() {
            return Ok(());
        }

        let mut chunks = self.generator.generate(query, history, &context).await?;
        while let Some(chunk) = chunks.recv().await {
            let chunk = chunk.map_err(PipelineError::generation)?;
            if events.send(PipelineEvent::ResponseChunk(chunk)).await.is_err() {
                tracing::debug!("Client went away; stopping generation");
                return Ok(());
            }
        }

        let _ = events.send(PipelineEvent::ResponseFinished).await;
        Ok(())
    }
}
