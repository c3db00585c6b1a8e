use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};

use crate::config::{AzureSettings, HttpSettings};
use crate::error::{KreatError, Result};
use crate::interfaces::providers::{CompletionOptions, LlmProvider};
use crate::providers::retry::{send_with_retry, RetryPolicy};

/// Chat completions against an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    settings: AzureSettings,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl AzureOpenAiProvider {
    pub fn new(settings: AzureSettings, http: HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout)
            .build()
            .map_err(|e| KreatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            settings,
            retry: http.retry,
            client,
        })
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.settings.endpoint, self.settings.deployment
        )
    }

    fn build_user_text_message(prompt: &str) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                prompt.to_string(),
            ))
            .build()
            .map_err(|e| KreatError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::User(message))
    }

    fn build_request(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.settings.deployment.clone());
        builder.messages(vec![Self::build_user_text_message(prompt)?]);
        if let Some(temperature) = options.temperature.or(self.settings.temperature) {
            builder.temperature(temperature);
        }
        builder
            .build()
            .map_err(|e| KreatError::Runtime(e.to_string()))
    }

    fn extract_text_from_value(value: &Value) -> Result<String> {
        let choice = value
            .get("choices")
            .and_then(|choices| choices.get(0))
            .ok_or_else(|| {
                KreatError::Serialization("chat completion returned no choices".to_string())
            })?;
        Ok(choice
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn generate_text(&self, prompt: &str, options: CompletionOptions) -> Result<String> {
        let request = self.build_request(prompt, options)?;
        let url = self.completions_url();
        debug!(
            deployment = %self.settings.deployment,
            prompt_chars = prompt.len(),
            "sending chat completion"
        );

        let response = send_with_retry(&self.retry, "Azure OpenAI", || {
            self.client
                .post(url.as_str())
                .header("api-key", self.settings.api_key.as_str())
                .query(&[("api-version", self.settings.api_version.as_str())])
                .json(&request)
        })
        .await?;

        let body = response
            .text()
            .await
            .map_err(|e| KreatError::Upstream(format!("chat completion read failed: {e}")))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            KreatError::Serialization(format!("chat completion decode failed: {e}"))
        })?;
        let text = Self::extract_text_from_value(&value)?;
        debug!(reply_chars = text.len(), "chat completion received");
        Ok(text)
    }
}
