//! Web search via the Google Custom Search JSON API

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracker_core::{Result, TrackerError};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Ranked web search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

/// Google Custom Search client
pub struct GoogleSearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
    rate_limiter: SharedRateLimiter,
}

impl GoogleSearchClient {
    /// Create a new search client
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::collaborator("google-search", e))?;

        // Free tier allows 100 queries/day; one per second keeps bursts polite
        let quota = Quota::per_second(NonZeroU32::new(1).expect("nonzero"));

        Ok(Self {
            client,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.rate_limiter.until_ready().await;

        let num = max_results.clamp(1, 10).to_string();
        let params = [
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ];

        let response = self
            .client
            .get(BASE_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| TrackerError::collaborator("google-search", e))?;

        if !response.status().is_success() {
            return Err(TrackerError::collaborator(
                "google-search",
                format!("HTTP {}", response.status()),
            ));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TrackerError::collaborator("google-search", e))?;

        Ok(parse_items(&data))
    }
}

fn parse_items(data: &serde_json::Value) -> Vec<SearchResult> {
    data.get("items")
        .and_then(|items| items.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| SearchResult {
                    title: str_field(item, "title"),
                    snippet: str_field(item, "snippet"),
                    url: str_field(item, "link"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(item: &serde_json::Value, field: &str) -> String {
    item.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_items() {
        let data = json!({
            "items": [
                {
                    "title": "DraftKings stock jumps after CFTC approval",
                    "snippet": "Shares of DraftKings rose sharply...",
                    "link": "https://example.com/news1"
                },
                { "title": "Second hit" }
            ]
        });

        let results = parse_items(&data);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "DraftKings stock jumps after CFTC approval");
        assert_eq!(results[0].url, "https://example.com/news1");
        // Missing fields come back empty, not as an error
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_parse_items_no_results() {
        assert!(parse_items(&json!({})).is_empty());
        assert!(parse_items(&json!({ "items": [] })).is_empty());
    }
}
