use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Incremental completion text, in generation order.
pub type ChunkReceiver = mpsc::Receiver<Result<String, ApiError>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name for logs (e.g. "openai", "dummy")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// chat completion (streaming)
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkReceiver, ApiError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    /// embed a batch of documents, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
