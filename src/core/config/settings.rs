//! Typed views over the loosely-typed YAML configuration.
//!
//! The config file is kept as a `serde_json::Value`; each view pulls the keys
//! it needs and falls back to defaults for anything missing.

use serde_json::Value;

use crate::core::errors::ApiError;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_RESULTS: usize = 15;
/// Hard bounds on reranking; config may tighten them but never relax them.
pub const MIN_SIMILARITY_THRESHOLD: f32 = 0.5;
pub const MAX_SIMILARITY_THRESHOLD: f32 = 1.0;
pub const MAX_RERANKED_RESULTS: usize = 15;
pub const DEFAULT_SEARXNG_URL: &str = "http://localhost:8080";
pub const DEFAULT_OPENAI_BASE_URL: &str = "http://localhost:1234";
pub const DEFAULT_PORT: u16 = 3001;

fn section<'a>(config: &'a Value, name: &str) -> Option<&'a Value> {
    config.get(name)
}

fn str_field(config: &Value, section_name: &str, key: &str) -> Option<String> {
    section(config, section_name)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub language: String,
    pub rewrite_query: bool,
    pub similarity_threshold: f32,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            rewrite_query: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &Value) -> Self {
        let defaults = Self::default();
        let search = section(config, "search");

        Self {
            language: str_field(config, "search", "language").unwrap_or(defaults.language),
            rewrite_query: search
                .and_then(|v| v.get("rewrite_query"))
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.rewrite_query),
            similarity_threshold: search
                .and_then(|v| v.get("similarity_threshold"))
                .and_then(|v| v.as_f64())
                .map(|v| v as f32)
                .unwrap_or(defaults.similarity_threshold)
                .clamp(MIN_SIMILARITY_THRESHOLD, MAX_SIMILARITY_THRESHOLD),
            max_results: search
                .and_then(|v| v.get("max_results"))
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(defaults.max_results)
                .clamp(1, MAX_RERANKED_RESULTS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchProviderSettings {
    Searxng { base_url: String },
    Brave { api_key: String },
}

impl SearchProviderSettings {
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        let provider =
            str_field(config, "search", "provider").unwrap_or_else(|| "searxng".to_string());

        match provider.as_str() {
            "searxng" => Ok(Self::Searxng {
                base_url: str_field(config, "search", "searxng_url")
                    .unwrap_or_else(|| DEFAULT_SEARXNG_URL.to_string()),
            }),
            "brave" => {
                let api_key = str_field(config, "search", "brave_api_key").ok_or_else(|| {
                    ApiError::BadRequest(
                        "search.brave_api_key is required for the brave provider".to_string(),
                    )
                })?;
                Ok(Self::Brave { api_key })
            }
            other => Err(ApiError::BadRequest(format!(
                "Unknown search provider: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    OpenAi,
    Dummy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

impl LlmSettings {
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        let llm = section(config, "llm");
        let provider = match str_field(config, "llm", "provider").as_deref() {
            None | Some("openai") => LlmProviderKind::OpenAi,
            Some("dummy") => LlmProviderKind::Dummy,
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "Unknown llm provider: {}",
                    other
                )))
            }
        };

        Ok(Self {
            provider,
            base_url: str_field(config, "llm", "base_url")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: str_field(config, "llm", "api_key"),
            model: str_field(config, "llm", "model").unwrap_or_else(|| "default".to_string()),
            temperature: llm
                .and_then(|v| v.get("temperature"))
                .and_then(|v| v.as_f64()),
            max_tokens: llm
                .and_then(|v| v.get("max_tokens"))
                .and_then(|v| v.as_i64())
                .map(|v| v as i32),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl EmbeddingSettings {
    pub fn from_config(config: &Value) -> Self {
        Self {
            base_url: str_field(config, "embeddings", "base_url")
                .or_else(|| str_field(config, "llm", "base_url"))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: str_field(config, "embeddings", "api_key")
                .or_else(|| str_field(config, "llm", "api_key")),
            model: str_field(config, "embeddings", "model")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl ServerSettings {
    pub fn from_config(config: &Value) -> Self {
        let server = section(config, "server");
        let allowed_origins = server
            .and_then(|v| v.get("allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_local_origins);

        Self {
            host: str_field(config, "server", "host").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: server
                .and_then(|v| v.get("port"))
                .and_then(|v| v.as_u64())
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(DEFAULT_PORT),
            allowed_origins,
        }
    }
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}
