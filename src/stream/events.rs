use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;
use crate::rag::Document;

/// Message sent to the client in place of any internal failure detail.
pub const GENERIC_ERROR_MESSAGE: &str = "An error has occurred please try again later";

/// Events delivered to the caller, in wire form
/// `{"type": "sources" | "response" | "end" | "error", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    Sources(Vec<Document>),
    Response(String),
    End,
    Error(String),
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Sources(_) => "sources",
            StreamEvent::Response(_) => "response",
            StreamEvent::End => "end",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::End | StreamEvent::Error(_))
    }
}

/// Checkpoints reported by the pipeline task to the router.
#[derive(Debug)]
pub enum PipelineEvent {
    /// Reranking finished; these are the final sources.
    SourcesRetrieved(Vec<Document>),
    ResponseChunk(String),
    ResponseFinished,
    Failed(PipelineError),
}
