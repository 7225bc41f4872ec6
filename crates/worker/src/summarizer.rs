//! Summarizer collaborator.
//!
//! A summarizer turns the report prompt into text. The only shipped
//! implementation talks to an OpenAI-compatible `chat/completions` endpoint.

use async_trait::async_trait;
use collector_core::{Error, Result, SummaryFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Text in, text out. No retries; the caller treats any error as "no summary".
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;

    /// How the returned text should be parsed.
    fn format(&self) -> SummaryFormat {
        SummaryFormat::Fenced
    }
}

/// Summarizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ask for `response_format: json_object` and parse the whole reply
    #[serde(default)]
    pub structured_output: bool,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            structured_output: false,
        }
    }
}

impl SummarizerConfig {
    /// Build the configured summarizer, or `None` when disabled.
    pub fn build(&self) -> Result<Option<Arc<dyn Summarizer>>> {
        if !self.enabled {
            return Ok(None);
        }
        let summarizer = LlmSummarizer::new(self)?;
        Ok(Some(Arc::new(summarizer)))
    }
}

/// HTTP is allowed only for local servers, so the key never crosses the network in cleartext.
fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url)
        .map_err(|e| Error::internal(format!("Invalid summarizer base_url '{}': {}", base_url, e)))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let host = parsed.host_str().unwrap_or_default();
            if matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1") {
                warn!(base_url, "Summarizer uses plain HTTP on localhost");
                Ok(())
            } else {
                Err(Error::internal(format!(
                    "HTTP is only permitted for localhost summarizers (base_url: '{}')",
                    base_url
                )))
            }
        }
        scheme => Err(Error::internal(format!(
            "Unsupported URL scheme '{}' in summarizer base_url",
            scheme
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions summarizer.
pub struct LlmSummarizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    structured: bool,
}

impl LlmSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        validate_base_url(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            warn!("Summarizer enabled without an API key");
        }

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            structured: config.structured_output,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if self.structured {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

fn first_content(text: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(text)
        .map_err(|e| Error::summarizer(format!("Unreadable completion: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::summarizer("Completion has no message content"))
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        info!(model = %self.model, url = %self.endpoint, "Requesting report summary");

        let mut request = self.client.post(&self.endpoint).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::summarizer(format!("Summarizer request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::summarizer(format!("Summarizer response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(Error::summarizer(format!(
                "Summarizer returned {}: {}",
                status,
                truncate(&text, 500)
            )));
        }

        debug!(bytes = text.len(), "Summarizer responded");
        first_content(&text)
    }

    fn format(&self) -> SummaryFormat {
        if self.structured {
            SummaryFormat::Structured
        } else {
            SummaryFormat::Fenced
        }
    }
}

/// Truncate on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
