//! Collaborator adapters for the tracker
//!
//! Each external dependency sits behind a small async trait with one
//! concrete HTTP implementation:
//!
//! - [`MarketData`] / [`YahooMarketData`] - daily price windows
//! - [`FinancialsProvider`] / [`SecEdgarFinancials`] - quarterly revenue
//!   and net income from SEC EDGAR XBRL facts
//! - [`SearchProvider`] / [`GoogleSearchClient`] - ranked news search
//! - [`NarrativeGenerator`] / [`AnthropicGenerator`] - narrative text
//! - [`Notifier`] / [`SlackWebhook`] - daily summary webhook
//!
//! All calls are bounded by the configured request timeout. Failures map
//! to the tracker's error taxonomy; none of them panic or retry here -
//! degradation policy belongs to the pipeline.

pub mod cache;
pub mod edgar;
pub mod market;
pub mod narrative;
pub mod notify;
pub mod search;

pub use cache::{CacheKey, ProviderCache};
pub use edgar::{FinancialsProvider, SecEdgarFinancials};
pub use market::{MarketData, YahooMarketData};
pub use narrative::{AnthropicGenerator, NarrativeGenerator};
pub use notify::{Notifier, SlackMessage, SlackWebhook, daily_summary};
pub use search::{GoogleSearchClient, SearchProvider, SearchResult};
