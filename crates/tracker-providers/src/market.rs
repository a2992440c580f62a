//! Daily market data via Yahoo Finance

use crate::cache::{CacheKey, ProviderCache};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::json;
use std::time::Duration;
use time::OffsetDateTime;
use tracker_core::{RawBar, Result, TrackerError};
use yahoo_finance_api as yahoo;

/// Days of lead-in fetched before the target date, so the exact row is in
/// the window even after a long weekend or holiday run
const WINDOW_LEAD_DAYS: i64 = 5;

/// Source of raw daily price bars
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch the provider window around one target date
    ///
    /// The window may be empty (market closed through the whole span) and
    /// may contain neighboring days; exact-date selection is the
    /// normalizer's job, not the provider's.
    async fn daily_window(&self, ticker: &str, date: NaiveDate) -> Result<Vec<RawBar>>;
}

/// Yahoo Finance market data client
pub struct YahooMarketData {
    cache: ProviderCache,
}

impl YahooMarketData {
    pub fn new() -> Self {
        Self {
            cache: ProviderCache::new(Duration::from_secs(300)),
        }
    }

    async fn fetch_window(&self, ticker: &str, date: NaiveDate) -> Result<Vec<RawBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| TrackerError::collaborator("yahoo", e))?;

        let start = to_offset(date - ChronoDuration::days(WINDOW_LEAD_DAYS))?;
        let end = to_offset(date + ChronoDuration::days(1))?;

        let response = provider
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| TrackerError::NoData {
                symbol: ticker.to_string(),
                reason: e.to_string(),
            })?;

        let quotes = response.quotes().map_err(|e| TrackerError::NoData {
            symbol: ticker.to_string(),
            reason: e.to_string(),
        })?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0).map(|ts| RawBar {
                    date: ts.date_naive(),
                    open: q.open,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect())
    }
}

impl Default for YahooMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn daily_window(&self, ticker: &str, date: NaiveDate) -> Result<Vec<RawBar>> {
        let key = CacheKey::new(ticker, "window", json!({ "date": date }));
        let cached = self
            .cache
            .get_or_fetch(key, || async {
                let bars = self.fetch_window(ticker, date).await?;
                serde_json::to_value(encode_bars(&bars))
                    .map_err(|e| TrackerError::collaborator("yahoo", e))
            })
            .await?;

        let encoded: Vec<(NaiveDate, f64, f64, u64)> = serde_json::from_value(cached)
            .map_err(|e| TrackerError::collaborator("yahoo", e))?;
        Ok(decode_bars(&encoded))
    }
}

fn encode_bars(bars: &[RawBar]) -> Vec<(NaiveDate, f64, f64, u64)> {
    bars.iter()
        .map(|b| (b.date, b.open, b.close, b.volume))
        .collect()
}

fn decode_bars(encoded: &[(NaiveDate, f64, f64, u64)]) -> Vec<RawBar> {
    encoded
        .iter()
        .map(|&(date, open, close, volume)| RawBar {
            date,
            open,
            close,
            volume,
        })
        .collect()
}

/// Convert a calendar date (midnight UTC) to the time crate's
/// OffsetDateTime the Yahoo client expects
fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
    let ts = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).timestamp())
        .ok_or_else(|| TrackerError::collaborator("yahoo", format!("invalid date {date}")))?;

    OffsetDateTime::from_unix_timestamp(ts)
        .map_err(|e| TrackerError::collaborator("yahoo", format!("invalid timestamp: {e}")))
}
