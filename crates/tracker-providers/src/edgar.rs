//! SEC EDGAR client for quarterly revenue and net income
//!
//! Pulls XBRL company facts from the SEC's public API and reduces them to
//! one revenue/earnings pair per fiscal quarter.
//!
//! Rate limit: 10 requests per second (per the SEC fair access policy).
//! User-Agent requirement: must identify the application and a contact.

use crate::cache::{CacheKey, ProviderCache};
use async_trait::async_trait;
use chrono::NaiveDate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::json;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracker_core::{FiscalQuarter, QuarterlyFinancials, Result, TrackerError};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SEC_BASE_URL: &str = "https://data.sec.gov";
const SEC_COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Revenue concepts tried in order; filers use one or the other
const REVENUE_CONCEPTS: &[&str] = &[
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
];
const INCOME_CONCEPTS: &[&str] = &["NetIncomeLoss"];

/// A reported value covering roughly one quarter. 10-Q filings also carry
/// six- and nine-month year-to-date figures under the same concepts.
const QUARTER_MIN_DAYS: i64 = 80;
const QUARTER_MAX_DAYS: i64 = 100;

/// Source of quarterly financial figures
#[async_trait]
pub trait FinancialsProvider: Send + Sync {
    /// Quarterly revenue and net income for one ticker, keyed by fiscal
    /// quarter
    async fn quarterly_financials(
        &self,
        ticker: &str,
    ) -> Result<BTreeMap<FiscalQuarter, QuarterlyFinancials>>;
}

/// SEC EDGAR financials client
pub struct SecEdgarFinancials {
    client: Client,
    user_agent: String,
    rate_limiter: SharedRateLimiter,
    cache: ProviderCache,
}

impl SecEdgarFinancials {
    /// Create a new client
    ///
    /// `user_agent` must name the application and a contact email, per the
    /// SEC's access policy.
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::collaborator("sec-edgar", e))?;

        let quota = Quota::per_second(NonZeroU32::new(10).expect("nonzero"));

        Ok(Self {
            client,
            user_agent: user_agent.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            // Facts files are large and change at most daily
            cache: ProviderCache::new(Duration::from_secs(3600)),
        })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| TrackerError::collaborator("sec-edgar", e))?;

        if !response.status().is_success() {
            return Err(TrackerError::collaborator(
                "sec-edgar",
                format!("HTTP {} for {url}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| TrackerError::collaborator("sec-edgar", e))
    }

    /// Resolve a ticker to its Central Index Key
    ///
    /// The full ticker table is one request and is cached across the
    /// per-company loop.
    pub async fn get_cik(&self, ticker: &str) -> Result<String> {
        let key = CacheKey::new("", "cik_map", json!({}));
        let table = self
            .cache
            .get_or_fetch(key, || self.get_json(SEC_COMPANY_TICKERS_URL))
            .await?;

        lookup_cik(&table, ticker)
            .ok_or_else(|| TrackerError::NoData {
                symbol: ticker.to_string(),
                reason: "ticker not in SEC company table".to_string(),
            })
    }

    async fn company_facts(&self, cik: &str) -> Result<serde_json::Value> {
        let cik_padded = format!("{:0>10}", cik.trim_start_matches('0'));
        let url = format!("{SEC_BASE_URL}/api/xbrl/companyfacts/CIK{cik_padded}.json");

        let key = CacheKey::new(cik, "companyfacts", json!({}));
        self.cache.get_or_fetch(key, || self.get_json(&url)).await
    }
}

#[async_trait]
impl FinancialsProvider for SecEdgarFinancials {
    async fn quarterly_financials(
        &self,
        ticker: &str,
    ) -> Result<BTreeMap<FiscalQuarter, QuarterlyFinancials>> {
        let cik = self.get_cik(ticker).await?;
        let facts = self.company_facts(&cik).await?;
        Ok(extract_quarters(&facts))
    }
}

/// Find a ticker's CIK in the SEC company table. The `cik_str` field is
/// numeric in the live file; tolerate a string as well.
fn lookup_cik(table: &serde_json::Value, ticker: &str) -> Option<String> {
    let ticker_upper = ticker.to_uppercase();
    let companies = table.as_object()?;

    for company in companies.values() {
        let matches = company
            .get("ticker")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t.to_uppercase() == ticker_upper);
        if !matches {
            continue;
        }

        let cik = company.get("cik_str")?;
        if let Some(n) = cik.as_u64() {
            return Some(n.to_string());
        }
        return cik.as_str().map(ToString::to_string);
    }

    None
}

/// Reduce an XBRL companyfacts document to per-quarter figures
///
/// Keeps only values whose reporting period spans a single quarter, maps
/// the period end date to a fiscal quarter, and lets the most recently
/// filed value win when a quarter was restated.
fn extract_quarters(facts: &serde_json::Value) -> BTreeMap<FiscalQuarter, QuarterlyFinancials> {
    let Some(us_gaap) = facts.pointer("/facts/us-gaap") else {
        return BTreeMap::new();
    };

    let revenues = concept_values(us_gaap, REVENUE_CONCEPTS);
    let incomes = concept_values(us_gaap, INCOME_CONCEPTS);

    let mut quarters: BTreeMap<FiscalQuarter, QuarterlyFinancials> = BTreeMap::new();

    for (quarter, (end, value, _)) in &revenues {
        let entry = quarters.entry(*quarter).or_default();
        entry.report_date = Some(*end);
        entry.revenue = Some(*value);
    }
    for (quarter, (end, value, _)) in &incomes {
        let entry = quarters.entry(*quarter).or_default();
        entry.report_date.get_or_insert(*end);
        entry.earnings = Some(*value);
    }

    quarters
}

/// Latest-filed single-quarter value per fiscal quarter for the first
/// concept that yields anything
fn concept_values(
    us_gaap: &serde_json::Value,
    concepts: &[&str],
) -> BTreeMap<FiscalQuarter, (NaiveDate, f64, String)> {
    for concept in concepts {
        let mut values: BTreeMap<FiscalQuarter, (NaiveDate, f64, String)> = BTreeMap::new();

        let entries = us_gaap
            .pointer(&format!("/{concept}/units/USD"))
            .and_then(|u| u.as_array());
        let Some(entries) = entries else { continue };

        for entry in entries {
            let Some((start, end, value, filed)) = parse_entry(entry) else {
                continue;
            };

            let span = (end - start).num_days();
            if !(QUARTER_MIN_DAYS..=QUARTER_MAX_DAYS).contains(&span) {
                continue;
            }

            let quarter = FiscalQuarter::from_date(end);
            let newer = values
                .get(&quarter)
                .is_none_or(|(_, _, existing_filed)| *existing_filed < filed);
            if newer {
                values.insert(quarter, (end, value, filed));
            }
        }

        if !values.is_empty() {
            return values;
        }
    }

    BTreeMap::new()
}

fn parse_entry(entry: &serde_json::Value) -> Option<(NaiveDate, NaiveDate, f64, String)> {
    let start: NaiveDate = entry.get("start")?.as_str()?.parse().ok()?;
    let end: NaiveDate = entry.get("end")?.as_str()?.parse().ok()?;
    let value = entry.get("val")?.as_f64()?;
    let filed = entry.get("filed")?.as_str()?.to_string();
    Some((start, end, value, filed))
}
