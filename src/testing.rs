//! In-memory stand-ins for the external providers, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, ChunkReceiver, EmbeddingProvider, LlmProvider};
use crate::rag::Document;
use crate::tools::search::{SearchHit, SearchOptions, SearchProvider, SearchResponse};

pub fn doc(content: &str) -> Document {
    Document::new(
        content,
        format!("Title {content}"),
        format!("https://example.com/{content}"),
    )
}

pub fn hit(content: Option<&str>, url: &str) -> SearchHit {
    SearchHit {
        title: format!("Title {url}"),
        url: url.to_string(),
        content: content.map(|c| c.to_string()),
        img_src: None,
    }
}

/// Embedder with a fixed query vector and per-text document vectors.
/// Unknown documents embed to the query vector.
pub struct MapEmbedder {
    query: Vec<f32>,
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    query_calls: AtomicUsize,
    document_calls: AtomicUsize,
    embedded_documents: AtomicUsize,
}

impl MapEmbedder {
    pub fn new(query: Vec<f32>) -> Self {
        Self {
            query,
            vectors: HashMap::new(),
            fail: false,
            query_calls: AtomicUsize::new(0),
            document_calls: AtomicUsize::new(0),
            embedded_documents: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn embedded_documents(&self) -> usize {
        self.embedded_documents.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MapEmbedder {
    fn name(&self) -> &str {
        "map"
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ApiError::Internal("embedder offline".to_string()));
        }
        Ok(self.query.clone())
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded_documents.fetch_add(texts.len(), Ordering::SeqCst);
        if self.fail {
            return Err(ApiError::Internal("embedder offline".to_string()));
        }
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.query.clone())
            })
            .collect())
    }
}

/// Search backend returning a canned response, or failing.
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        query: &str,
        _options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        if self.fail {
            return Err(ApiError::Internal("search backend unreachable".to_string()));
        }
        Ok(SearchResponse {
            results: self.hits.clone(),
        })
    }
}

/// Chat model that replays scripted chunks, optionally failing partway.
pub struct ScriptedChat {
    reply: String,
    chunks: Vec<String>,
    fail_after: Option<usize>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            reply: chunks.concat(),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail_after: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Fail the stream after `n` chunks were delivered.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedChat {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        Ok(self.reply.clone())
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<ChunkReceiver, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let (tx, rx) = mpsc::channel(self.chunks.len() + 1);
        for (delivered, chunk) in self.chunks.iter().enumerate() {
            if self.fail_after == Some(delivered) {
                let _ = tx
                    .send(Err(ApiError::Internal("connection reset".to_string())))
                    .await;
                return Ok(rx);
            }
            let _ = tx.send(Ok(chunk.clone())).await;
        }
        if self.fail_after == Some(self.chunks.len()) {
            let _ = tx
                .send(Err(ApiError::Internal("connection reset".to_string())))
                .await;
        }
        Ok(rx)
    }
}
