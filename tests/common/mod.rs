#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use kreat::error::{KreatError, Result};
use kreat::interfaces::providers::{CompletionOptions, LlmProvider};
use kreat::interfaces::search::{SearchDocument, SearchProvider};

/// Replies in order and records every prompt it was sent.
#[derive(Default)]
pub struct QueueLlmProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, CompletionOptions)>>,
}

impl QueueLlmProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn options(&self) -> Vec<CompletionOptions> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| *options)
            .collect()
    }
}

#[async_trait]
impl LlmProvider for QueueLlmProvider {
    async fn generate_text(&self, prompt: &str, options: CompletionOptions) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), options));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KreatError::Runtime("no queued reply".to_string()))
    }
}

pub struct StaticSearchProvider {
    pub docs: Vec<SearchDocument>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearchProvider {
    pub fn new(docs: Vec<SearchDocument>) -> Self {
        Self {
            docs,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchDocument>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), num_results));
        Ok(self.docs.iter().take(num_results).cloned().collect())
    }
}

pub fn document(title: &str, words: usize) -> SearchDocument {
    SearchDocument {
        url: format!("https://market.example/{title}"),
        title: Some(title.to_string()),
        author: Some("Analyst".to_string()),
        published_date: Some("2024-05-01".to_string()),
        text: Some(vec!["insight"; words].join(" ")),
        score: Some(0.5),
    }
}
