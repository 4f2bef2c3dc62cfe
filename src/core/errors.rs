use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failures raised by the answering pipeline.
///
/// None of these are shown to the client verbatim; the event router turns
/// every one of them into the same generic `error` event.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("invalid vector: {0}")]
    InvalidVector(String),
}

impl PipelineError {
    pub fn retrieval<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Retrieval(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Embedding(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Generation(err.to_string())
    }

    /// Short stage label used in log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Retrieval(_) => "retrieval",
            PipelineError::Embedding(_) => "embedding",
            PipelineError::Generation(_) => "generation",
            PipelineError::InvalidVector(_) => "similarity",
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidVector(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
