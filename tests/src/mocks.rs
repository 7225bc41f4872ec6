//! Mock implementations for testing.

use async_trait::async_trait;
use collector_core::{Error, Result, SummaryFormat};
use parking_lot::Mutex;
use std::sync::Arc;
use worker::Summarizer;

/// Mock summarizer with a canned reply.
///
/// Implements the same `Summarizer` trait as the HTTP client, so report
/// generation runs its real parsing path without a network call.
#[derive(Clone)]
pub struct MockSummarizer {
    reply: Arc<Mutex<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    format: SummaryFormat,
}

impl MockSummarizer {
    /// Reply with `text` to every prompt.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Arc::new(Mutex::new(Some(text.into()))),
            prompts: Arc::new(Mutex::new(Vec::new())),
            format: SummaryFormat::Fenced,
        }
    }

    /// Fail every call as if the provider were unreachable.
    pub fn failing() -> Self {
        Self {
            reply: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            format: SummaryFormat::Fenced,
        }
    }

    /// Advertise structured (bare JSON) output.
    pub fn structured(mut self) -> Self {
        self.format = SummaryFormat::Structured;
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.reply
            .lock()
            .clone()
            .ok_or_else(|| Error::summarizer("Mock summarizer failure"))
    }

    fn format(&self) -> SummaryFormat {
        self.format
    }
}
