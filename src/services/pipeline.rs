use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{KreatError, Result};
use crate::interfaces::providers::LlmProvider;
use crate::parsing::{parse_fields, ParsedFields};
use crate::prompts::{render, PromptVars, TemplateId};
use crate::render::ActionOutput;

/// A structured reply: the parsed map, the keys the model left out and the
/// raw text for display when parsing was incomplete.
#[derive(Debug, Clone)]
pub struct FieldReply {
    pub fields: ParsedFields,
    pub missing: Vec<String>,
    pub raw: String,
}

impl FieldReply {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Table of every expected key; on a partial reply also one warning per
    /// missing key and the raw reply.
    pub fn to_output(&self, title: &str) -> ActionOutput {
        let mut output = ActionOutput::new().table(title, self.fields.rows());
        if self.is_complete() {
            return output;
        }
        for key in &self.missing {
            let err = KreatError::ResponseFormat {
                missing: vec![key.clone()],
            };
            output = output.warning(err.to_string());
        }
        output.notice("Raw reply follows.").markdown(self.raw.clone())
    }
}

/// Render a template, call the model, optionally parse.
#[derive(Clone)]
pub struct Pipeline {
    llm: Arc<dyn LlmProvider>,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn complete(&self, template: TemplateId, vars: &PromptVars) -> Result<String> {
        let prompt = render(template, vars);
        let started = Instant::now();
        debug!(
            template = template.name(),
            prompt_chars = prompt.len(),
            "rendered prompt"
        );
        let reply = self.llm.generate_text(&prompt, template.options()).await?;
        debug!(
            template = template.name(),
            reply_chars = reply.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model replied"
        );
        Ok(reply)
    }

    /// Strict parse. A `ResponseFormat` failure is folded into the reply
    /// instead of aborting the action.
    pub async fn complete_fields(
        &self,
        template: TemplateId,
        vars: &PromptVars,
    ) -> Result<FieldReply> {
        let raw = self.complete(template, vars).await?;
        let fields = parse_fields(&raw, template.fields());
        let missing = match fields.clone().require_all() {
            Ok(_) => Vec::new(),
            Err(KreatError::ResponseFormat { missing }) => {
                warn!(
                    template = template.name(),
                    missing = %missing.join(","),
                    "reply is missing expected fields"
                );
                missing
            }
            Err(other) => return Err(other),
        };
        Ok(FieldReply {
            fields,
            missing,
            raw,
        })
    }
}
