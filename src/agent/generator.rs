use std::sync::Arc;

use chrono::Utc;

use super::prompt::{build_response_messages, PromptInput};
use crate::core::config::LlmSettings;
use crate::core::errors::PipelineError;
use crate::llm::{ChatMessage, ChatRequest, ChunkReceiver, LlmProvider};

/// Streams the cited, long-form answer for a query and its context block.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { llm, settings }
    }

    /// Failures while opening the stream come back here; failures after that
    /// arrive as `Err` items on the receiver.
    pub async fn generate(
        &self,
        query: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<ChunkReceiver, PipelineError> {
        let messages = build_response_messages(&PromptInput {
            query,
            history,
            context,
            date: Utc::now(),
        });
        let request = ChatRequest::new(messages).with_settings(&self.settings);

        tracing::debug!(provider = self.llm.name(), "Starting answer stream");
        self.llm
            .stream_chat(request)
            .await
            .map_err(PipelineError::generation)
    }
}
