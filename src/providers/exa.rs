use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{ExaSettings, HttpSettings};
use crate::error::{KreatError, Result};
use crate::interfaces::search::{SearchDocument, SearchProvider};
use crate::providers::retry::{send_with_retry, RetryPolicy};

#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<SearchDocument>,
}

/// Exa search-and-contents client.
#[derive(Clone)]
pub struct ExaSearchProvider {
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl ExaSearchProvider {
    pub fn new(settings: &ExaSettings, http: HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout)
            .build()
            .map_err(|e| KreatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            retry: http.retry,
            client,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchProvider for ExaSearchProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchDocument>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KreatError::Input("search query is required".to_string()));
        }

        let payload = json!({
            "query": query,
            "numResults": num_results,
            "contents": {"text": true},
        });
        let url = self.search_url();

        let response = send_with_retry(&self.retry, "Exa search", || {
            self.client
                .post(url.as_str())
                .header("x-api-key", self.api_key.as_str())
                .json(&payload)
        })
        .await?;

        let body = response
            .text()
            .await
            .map_err(|e| KreatError::Upstream(format!("Exa search read failed: {e}")))?;
        let parsed: ExaSearchResponse = serde_json::from_str(&body)
            .map_err(|e| KreatError::Serialization(format!("Exa search decode failed: {e}")))?;

        let mut results = parsed.results;
        results.truncate(num_results);
        debug!(%query, returned = results.len(), "exa search finished");
        Ok(results)
    }
}
