use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};

use super::protocol::{WsIncomingMessage, WS_MESSAGE_TYPE};
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let origin_ok = validate_origin(&headers, &state.server.allowed_origins);
    ws.on_upgrade(move |socket| handle_socket(socket, state, origin_ok))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, origin_ok: bool) {
    let (mut sender, mut receiver) = socket.split();

    if !origin_ok {
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: 4003,
                reason: "Forbidden: Invalid Origin".into(),
            })))
            .await;
        return;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if tx.send(text.to_string()).is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Requests on one socket are answered in order, one at a time.
    while let Some(text) = rx.recv().await {
        if let Err(err) = handle_message(&mut sender, &state, &text).await {
            tracing::debug!(error = %err, "WebSocket send failed; closing");
            break;
        }
    }
}

async fn handle_message(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &Arc<AppState>,
    text: &str,
) -> Result<(), ApiError> {
    let incoming = match serde_json::from_str::<WsIncomingMessage>(text) {
        Ok(incoming) => incoming,
        Err(err) => {
            tracing::warn!(error = %err, "Malformed WebSocket message");
            return send_json(sender, json!({"type": "error", "data": "Invalid message format"}))
                .await;
        }
    };

    if let Some(kind) = incoming.msg_type.as_deref() {
        if kind != WS_MESSAGE_TYPE {
            return send_json(
                sender,
                json!({"type": "error", "data": format!("Unknown message type: {}", kind)}),
            )
            .await;
        }
    }

    let query = incoming.message.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return send_json(sender, json!({"type": "error", "data": "Message cannot be empty"}))
            .await;
    }

    let mut events = state.agent.handle(query.to_string(), incoming.history);
    while let Some(event) = events.recv().await {
        let payload = serde_json::to_value(&event).map_err(ApiError::internal)?;
        send_json(sender, payload).await?;
    }
    Ok(())
}

pub async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: Value,
) -> Result<(), ApiError> {
    let text = serde_json::to_string(&payload).map_err(ApiError::internal)?;
    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(ApiError::internal)?;
    Ok(())
}

/// Browsers always send `Origin`; other clients may omit it.
fn validate_origin(headers: &HeaderMap, allowed: &[String]) -> bool {
    let Some(origin) = headers.get("origin").and_then(|v| v.to_str().ok()) else {
        return true;
    };

    allowed.iter().any(|allowed_origin| {
        origin == allowed_origin || origin.starts_with(&format!("{}/", allowed_origin))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn allowed() -> Vec<String> {
        vec!["http://localhost:3000".to_string()]
    }

    #[test]
    fn missing_origin_is_allowed() {
        assert!(validate_origin(&HeaderMap::new(), &allowed()));
    }

    #[test]
    fn origin_must_be_listed() {
        let mut headers = HeaderMap::new();
        headers.insert("origin", HeaderValue::from_static("http://localhost:3000"));
        assert!(validate_origin(&headers, &allowed()));

        headers.insert("origin", HeaderValue::from_static("http://localhost:3000.evil.com"));
        assert!(!validate_origin(&headers, &allowed()));

        headers.insert("origin", HeaderValue::from_static("https://evil.example"));
        assert!(!validate_origin(&headers, &allowed()));
    }
}
