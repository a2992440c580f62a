//! Narrative generation via the Anthropic Messages API
//!
//! See: https://docs.anthropic.com/en/api/messages

use crate::search::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::debug;
use tracker_core::{Result, TrackerError};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Free-text generation over a prompt plus search context
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generate narrative text, or `None` when the model returned nothing
    /// usable
    async fn generate(&self, prompt: &str, context: &[SearchResult]) -> Result<Option<String>>;
}

/// Anthropic Claude generator
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicGenerator {
    /// Create a new generator
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::collaborator("anthropic", e))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl NarrativeGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str, context: &[SearchResult]) -> Result<Option<String>> {
        let full_prompt = build_prompt(prompt, context);
        debug!(model = %self.model, "requesting narrative");

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: full_prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TrackerError::collaborator("anthropic", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::collaborator(
                "anthropic",
                format!("HTTP {status}: {body}"),
            ));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::collaborator("anthropic", e))?;

        let text = parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(text)
    }
}

/// Append search results to the base prompt as a numbered list
fn build_prompt(prompt: &str, context: &[SearchResult]) -> String {
    if context.is_empty() {
        return prompt.to_string();
    }

    let mut full = format!("{prompt}\n\nWeb search results:\n");
    for (i, result) in context.iter().enumerate() {
        let _ = write!(
            full,
            "\n{}. {}\n   {}\n   URL: {}\n",
            i + 1,
            result.title,
            result.snippet,
            result.url
        );
    }
    full
}

// Anthropic request/response types - match the Messages API format exactly

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
