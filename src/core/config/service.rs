use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "access_token",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("WEBSEARCH_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Loads `config.yml` with `secrets.yaml` merged on top.
    ///
    /// Missing or unreadable files contribute an empty object, so a fresh
    /// install runs on built-in defaults.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        Ok(deep_merge(&public_config, &secrets_config))
    }

    /// Like [`load_config`](Self::load_config) but rejects malformed values.
    pub fn load_validated(&self) -> Result<Value, ApiError> {
        let config = self.load_config()?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparsable config file {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::with_dirs(dir.to_path_buf(), dir.join("data"));
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "search": { "language": "en", "max_results": 15 },
            "llm": { "model": "a" }
        });
        let override_value = json!({
            "search": { "max_results": 5 },
            "llm": { "api_key": "k" }
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "search": { "language": "en", "max_results": 5 },
                "llm": { "model": "a", "api_key": "k" }
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": { "api_key": "secret", "max_tokens": 42 },
            "search": { "brave_api_key": "brave" },
            "items": [ { "password": "pw" } ]
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": { "api_key": "****", "max_tokens": 42 },
                "search": { "brave_api_key": "****" },
                "items": [ { "password": "****" } ]
            })
        );
    }

    #[test]
    fn load_config_without_files_is_empty_object() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let service = service_in(tmp.path());
        assert_eq!(service.load_config().expect("load"), json!({}));
    }

    #[test]
    fn load_config_merges_secrets_over_public_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let service = service_in(tmp.path());
        fs::write(
            tmp.path().join("config.yml"),
            "llm:\n  model: local-model\n  api_key: placeholder\n",
        )
        .expect("write config");
        fs::write(service.secrets_path(), "llm:\n  api_key: real-key\n").expect("write secrets");

        let config = service.load_config().expect("load");
        assert_eq!(config["llm"]["model"], "local-model");
        assert_eq!(config["llm"]["api_key"], "real-key");
    }

    #[test]
    fn load_validated_rejects_out_of_range_values() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let service = service_in(tmp.path());
        fs::write(tmp.path().join("config.yml"), "search:\n  max_results: 0\n")
            .expect("write config");

        assert!(service.load_validated().is_err());
    }
}
