use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{KreatError, Result};
use crate::providers::retry::RetryPolicy;
use crate::secrets::{self, SecretStore};

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_EXA_BASE_URL: &str = "https://api.exa.ai";
pub const DEFAULT_SEARCH_RESULTS: usize = 3;
pub const DEFAULT_MARKET_WORD_LIMIT: usize = 1500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AzureOpenAiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub deployment: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ExaConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub num_results: Option<usize>,
    pub max_words: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub azure: Option<AzureOpenAiConfig>,
    #[serde(default)]
    pub exa: Option<ExaConfig>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

/// Validated settings for the chat-completion deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExaSettings {
    pub api_key: String,
    pub base_url: String,
    pub num_results: usize,
    pub max_words: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn fill_from_store(slot: &mut Option<String>, store: &SecretStore, name: &str) -> Result<()> {
    if non_empty(slot).is_none() {
        if let Some(secret) = store.get(name)? {
            *slot = Some(secret);
        }
    }
    Ok(())
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            KreatError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| KreatError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Like `from_file`, but a missing file yields an empty config so that
    /// secrets alone can drive the client.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                path = %path.as_ref().display(),
                "config file not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Fills credentials the file left empty from the secret store.
    pub fn resolve_secrets(mut self, store: &SecretStore) -> Result<Self> {
        let azure = self.azure.get_or_insert_with(AzureOpenAiConfig::default);
        fill_from_store(&mut azure.api_key, store, secrets::AZURE_OPENAI_API_KEY)?;
        fill_from_store(&mut azure.endpoint, store, secrets::AZURE_OPENAI_ENDPOINT)?;
        fill_from_store(
            &mut azure.api_version,
            store,
            secrets::AZURE_OPENAI_API_VERSION,
        )?;
        fill_from_store(
            &mut azure.deployment,
            store,
            secrets::AZURE_OPENAI_CHAT_DEPLOYMENT_NAME,
        )?;

        let exa = self.exa.get_or_insert_with(ExaConfig::default);
        fill_from_store(&mut exa.api_key, store, secrets::EXA_API_KEY)?;
        Ok(self)
    }

    pub fn azure_settings(&self) -> Result<AzureSettings> {
        let azure = self.azure.clone().unwrap_or_default();

        let mut missing = Vec::new();
        let endpoint = non_empty(&azure.endpoint);
        let api_key = non_empty(&azure.api_key);
        let deployment = non_empty(&azure.deployment);
        if endpoint.is_none() {
            missing.push(secrets::AZURE_OPENAI_ENDPOINT);
        }
        if api_key.is_none() {
            missing.push(secrets::AZURE_OPENAI_API_KEY);
        }
        if deployment.is_none() {
            missing.push(secrets::AZURE_OPENAI_CHAT_DEPLOYMENT_NAME);
        }
        let (Some(endpoint), Some(api_key), Some(deployment)) = (endpoint, api_key, deployment)
        else {
            return Err(KreatError::Config(format!(
                "missing Azure OpenAI settings: {}",
                missing.join(", ")
            )));
        };

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(KreatError::Config(format!(
                "Azure endpoint must be an http(s) URL, got {endpoint}"
            )));
        }
        if let Some(temperature) = azure.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(KreatError::Config(format!(
                    "temperature must be between 0 and 2, got {temperature}"
                )));
            }
        }

        Ok(AzureSettings {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: non_empty(&azure.api_version)
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            deployment,
            temperature: azure.temperature,
        })
    }

    /// `None` when no Exa key is configured; market analysis is then unavailable.
    pub fn exa_settings(&self) -> Result<Option<ExaSettings>> {
        let exa = self.exa.clone().unwrap_or_default();
        let Some(api_key) = non_empty(&exa.api_key) else {
            return Ok(None);
        };
        let num_results = exa.num_results.unwrap_or(DEFAULT_SEARCH_RESULTS);
        if num_results == 0 {
            return Err(KreatError::Config("exa.num_results must be at least 1".to_string()));
        }
        let max_words = exa.max_words.unwrap_or(DEFAULT_MARKET_WORD_LIMIT);
        if max_words == 0 {
            return Err(KreatError::Config("exa.max_words must be at least 1".to_string()));
        }
        Ok(Some(ExaSettings {
            api_key,
            base_url: non_empty(&exa.base_url)
                .unwrap_or_else(|| DEFAULT_EXA_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            num_results,
            max_words,
        }))
    }

    pub fn http_settings(&self) -> HttpSettings {
        let http = self.http.clone().unwrap_or_default();
        let defaults = RetryPolicy::default();
        HttpSettings {
            timeout: Duration::from_secs(http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1)),
            retry: RetryPolicy {
                max_attempts: http.max_attempts.unwrap_or(defaults.max_attempts).max(1),
                base_delay: http
                    .retry_base_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.base_delay),
                max_delay: defaults.max_delay,
            },
        }
    }
}
