use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{ChunkReceiver, EmbeddingProvider, LlmProvider};
use super::types::ChatRequest;
use crate::core::config::{EmbeddingSettings, LlmSettings};
use crate::core::errors::ApiError;

/// Client for any server speaking the OpenAI REST dialect
/// (OpenAI, LM Studio, llama.cpp server, vLLM, Ollama's `/v1`).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: &str, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            client: Client::new(),
        }
    }

    pub fn for_chat(settings: &LlmSettings) -> Self {
        Self::new(&settings.base_url, settings.api_key.clone(), &settings.model)
    }

    pub fn for_embeddings(settings: &EmbeddingSettings) -> Self {
        Self::new(&settings.base_url, settings.api_key.clone(), &settings.model)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn chat_body(&self, request: ChatRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = request.top_p { obj.insert("top_p".to_string(), json!(t)); }
            if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
            if let Some(s) = request.stop { obj.insert("stop".to_string(), json!(s)); }
        }

        body
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let res = self.post("/v1/embeddings")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Embedding request failed: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        parse_embeddings(&payload)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let body = self.chat_body(request, false);

        let res = self.post("/v1/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Chat completion failed: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::Internal("Chat completion returned no content".to_string()))
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkReceiver, ApiError> {
        let body = self.chat_body(request, true);

        let res = self.post("/v1/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Chat stream failed: {}", text)));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            let mut lines = LineBuffer::default();
            while let Some(item) = stream.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::internal(e))).await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    match parse_stream_line(&line) {
                        StreamLine::Done => return,
                        StreamLine::Content(content) => {
                            if tx.send(Ok(content)).await.is_err() {
                                return;
                            }
                        }
                        StreamLine::Failed(message) => {
                            let _ = tx.send(Err(ApiError::Internal(message))).await;
                            return;
                        }
                        StreamLine::Skip => {}
                    }
                }
            }

            // Connection closed without `[DONE]`.
            let _ = tx
                .send(Err(ApiError::Internal(
                    "Chat stream ended unexpectedly".to_string(),
                )))
                .await;
        });

        Ok(rx)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(ApiError::Internal(format!(
                "Expected 1 query embedding, got {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts).await
    }
}

/// Splits a byte stream into complete lines, holding back a trailing partial
/// line until the next push.
/// Bytes are only decoded once a full line is present, so a multi-byte
/// character split across network chunks survives intact.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        }
        lines
    }
}

#[derive(Debug, PartialEq)]
enum StreamLine {
    Content(String),
    Done,
    Failed(String),
    Skip,
}

fn parse_stream_line(line: &str) -> StreamLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return StreamLine::Done;
    }

    let Ok(json) = serde_json::from_str::<Value>(data) else {
        return StreamLine::Skip;
    };

    if let Some(message) = json["error"]["message"].as_str() {
        return StreamLine::Failed(message.to_string());
    }

    match json["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => StreamLine::Content(content.to_string()),
        _ => StreamLine::Skip,
    }
}

fn parse_embeddings(payload: &Value) -> Result<Vec<Vec<f32>>, ApiError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| ApiError::Internal("Embedding response has no data".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let vals = item["embedding"]
            .as_array()
            .ok_or_else(|| ApiError::Internal("Embedding item has no vector".to_string()))?;
        let vec = vals
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    ApiError::Internal(format!(
                        "Embedding item {} has a non-numeric entry: {}",
                        position, v
                    ))
                })
            })
            .collect::<Result<Vec<f32>, ApiError>>()?;
        let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(position);
        indexed.push((index, vec));
    }

    // Servers may answer out of order; `index` is authoritative.
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
