use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::SearchProviderSettings;
use crate::core::errors::ApiError;

/// One raw hit from a search backend. `content` is the page snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub img_src: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub language: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run one query; hits come back in the engine's ranking order.
    async fn search(&self, query: &str, options: &SearchOptions)
        -> Result<SearchResponse, ApiError>;
}

pub fn build_search_provider(settings: &SearchProviderSettings) -> Arc<dyn SearchProvider> {
    match settings {
        SearchProviderSettings::Searxng { base_url } => Arc::new(SearxngSearch::new(base_url)),
        SearchProviderSettings::Brave { api_key } => Arc::new(BraveSearch::new(api_key.clone())),
    }
}

/// Metasearch through a SearXNG instance's JSON API.
#[derive(Clone)]
pub struct SearxngSearch {
    base_url: String,
    client: Client,
}

impl SearxngSearch {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for SearxngSearch {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        let url = format!(
            "{}/search?format=json&q={}&language={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&options.language)
        );

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "SearXNG search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(parse_searxng_results(&payload))
    }
}

fn parse_searxng_results(payload: &Value) -> SearchResponse {
    let items = payload
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut results = Vec::new();
    for item in items {
        let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("url").and_then(|v| v.as_str()).unwrap_or("");
        let content = item
            .get("content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let img_src = item
            .get("img_src")
            .or_else(|| item.get("thumbnail_src"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        results.push(SearchHit {
            title: title.to_string(),
            url: url.to_string(),
            content,
            img_src,
        });
    }

    SearchResponse { results }
}

/// Brave Search web results API.
#[derive(Clone)]
pub struct BraveSearch {
    api_key: String,
    client: Client,
}

impl BraveSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&search_lang={}",
            urlencoding::encode(query),
            urlencoding::encode(&options.language)
        );

        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Brave search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(parse_brave_results(&payload))
    }
}

fn parse_brave_results(payload: &Value) -> SearchResponse {
    let mut results = Vec::new();

    if let Some(items) = payload
        .get("web")
        .and_then(|w| w.get("results"))
        .and_then(|v| v.as_array())
    {
        for item in items {
            let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let url = item.get("url").and_then(|v| v.as_str()).unwrap_or("");
            let content = item
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            let img_src = item
                .get("thumbnail")
                .and_then(|t| t.get("src"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            results.push(SearchHit {
                title: title.to_string(),
                url: url.to_string(),
                content,
                img_src,
            });
        }
    }

    SearchResponse { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn searxng_results_keep_every_hit_in_order() {
        let payload = json!({
            "query": "docker",
            "results": [
                { "title": "Docker", "url": "https://docker.com", "content": "Containers" },
                { "title": "No snippet", "url": "https://example.com/bare" },
                { "title": "Image", "url": "https://img.example", "content": "", "img_src": "https://img.example/a.png" },
                { "title": "Broken", "content": "no url" }
            ]
        });

        let response = parse_searxng_results(&payload);

        // Every hit is kept, even without a url; ranking decides later.
        assert_eq!(response.results.len(), 4);
        assert_eq!(response.results[0].url, "https://docker.com");
        assert_eq!(response.results[0].content.as_deref(), Some("Containers"));
        assert_eq!(response.results[1].content, None);
        assert_eq!(
            response.results[2].img_src.as_deref(),
            Some("https://img.example/a.png")
        );
        assert_eq!(response.results[3].url, "");
        assert_eq!(response.results[3].content.as_deref(), Some("no url"));
    }

    #[test]
    fn searxng_payload_without_results_is_empty() {
        assert!(parse_searxng_results(&json!({"error": "x"})).results.is_empty());
    }

    #[test]
    fn brave_results_map_description_to_content() {
        let payload = json!({
            "web": { "results": [
                { "title": "Rust", "url": "https://rust-lang.org", "description": "A language",
                  "thumbnail": { "src": "https://thumb" } }
            ]}
        });

        let response = parse_brave_results(&payload);

        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.results,
            vec![SearchHit {
                title: "Rust".into(),
                url: "https://rust-lang.org".into(),
                content: Some("A language".into()),
                img_src: Some("https://thumb".into()),
            }]
        );
    }
}
