use async_trait::async_trait;

use crate::error::Result;

/// Per-call knobs for a completion. Most prompts leave everything unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends `prompt` as a single user message and returns the reply text.
    async fn generate_text(&self, prompt: &str, options: CompletionOptions) -> Result<String>;
}
