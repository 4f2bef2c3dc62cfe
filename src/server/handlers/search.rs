use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::state::AppState;
use crate::stream::StreamEvent;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Runs one web search and streams its events as server-sent events, one
/// JSON event per SSE message, named after the event type.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = payload.message.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("message cannot be empty".to_string()));
    }

    let events = state
        .agent
        .handle(query.to_string(), payload.history)
        .into_stream()
        .map(|event| Ok::<Event, Infallible>(to_sse_event(&event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &StreamEvent) -> Event {
    let event_name = event.kind();
    Event::default()
        .event(event_name)
        .json_data(event)
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to encode stream event");
            Event::default().event(event_name).data("{}")
        })
}
