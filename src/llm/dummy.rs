use async_trait::async_trait;
use tokio::sync::mpsc;

use super::provider::{ChunkReceiver, LlmProvider};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Offline chat model that answers with the content of the first message.
///
/// Handy for running the whole pipeline without a model server; the
/// streaming variant delivers the answer as a single chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyChatModel;

impl DummyChatModel {
    fn respond(request: &ChatRequest) -> Result<String, ApiError> {
        let first = request
            .messages
            .first()
            .ok_or_else(|| ApiError::BadRequest("No messages provided.".to_string()))?;
        Ok(first.content.clone())
    }
}

#[async_trait]
impl LlmProvider for DummyChatModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        Self::respond(&request)
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkReceiver, ApiError> {
        let content = Self::respond(&request)?;
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh receiver: this send cannot fail.
        let _ = tx.send(Ok(content)).await;
        Ok(rx)
    }
}
