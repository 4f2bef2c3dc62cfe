pub mod dummy;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

pub use dummy::DummyChatModel;
pub use openai::OpenAiCompatProvider;
pub use provider::{ChunkReceiver, EmbeddingProvider, LlmProvider};
pub use types::{ChatMessage, ChatRequest, ChatRole};

use crate::core::config::{EmbeddingSettings, LlmProviderKind, LlmSettings};

pub fn build_llm_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    match settings.provider {
        LlmProviderKind::OpenAi => Arc::new(OpenAiCompatProvider::for_chat(settings)),
        LlmProviderKind::Dummy => Arc::new(DummyChatModel),
    }
}

pub fn build_embedding_provider(settings: &EmbeddingSettings) -> Arc<dyn EmbeddingProvider> {
    Arc::new(OpenAiCompatProvider::for_embeddings(settings))
}
