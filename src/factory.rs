use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::providers::azure::AzureOpenAiProvider;
use crate::providers::exa::ExaSearchProvider;
use crate::secrets::SecretStore;
use crate::services::conversation::{ConversationService, MarketSearch};

pub struct KreatFactory;

impl KreatFactory {
    /// Builds the service from a config whose secrets are already resolved.
    pub fn create_from_config(config: &Config) -> Result<ConversationService> {
        let azure = config.azure_settings()?;
        let http = config.http_settings();
        info!(
            endpoint = %azure.endpoint,
            deployment = %azure.deployment,
            api_version = %azure.api_version,
            "using Azure OpenAI deployment"
        );
        let llm = AzureOpenAiProvider::new(azure, http.clone())?;
        let mut service = ConversationService::new(Arc::new(llm));

        match config.exa_settings()? {
            Some(exa) => {
                let provider = ExaSearchProvider::new(&exa, http)?;
                service = service.with_market_search(MarketSearch {
                    provider: Arc::new(provider),
                    num_results: exa.num_results,
                    max_words: exa.max_words,
                });
            }
            None => info!("no Exa API key configured; market analysis disabled"),
        }
        Ok(service)
    }

    /// Loads the config file (missing is fine), fills secrets and builds the service.
    pub fn create_from_path(path: &str, store: &SecretStore) -> Result<ConversationService> {
        let config = Config::load(path)?.resolve_secrets(store)?;
        Self::create_from_config(&config)
    }
}
