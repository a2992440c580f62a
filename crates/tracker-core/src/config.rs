//! Configuration for the tracker
//!
//! Everything the original deployment hardcoded as module-level tables
//! (company list, benchmark, threshold, file locations) lives here as an
//! explicit structure handed to each component at construction.

use crate::error::{Result, TrackerError};
use crate::financials::FiscalQuarter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// One tracked company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Exchange ticker, unique within the config
    pub ticker: String,
    /// Display name
    pub name: String,
    /// Company web domain, used for logo lookup
    pub domain: Option<String>,
    /// Investor relations page
    pub ir_url: Option<String>,
}

impl Company {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            domain: None,
            ir_url: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_ir_url(mut self, url: impl Into<String>) -> Self {
        self.ir_url = Some(url.into());
        self
    }

    /// Logo URL via the Clearbit logo service, when a domain is configured
    pub fn logo_url(&self) -> Option<String> {
        self.domain
            .as_ref()
            .map(|d| format!("https://logo.clearbit.com/{d}"))
    }
}

/// Tracker configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Tracked companies, in display order
    pub companies: Vec<Company>,

    /// Benchmark index ticker (e.g. ^IXIC)
    pub benchmark_ticker: String,

    /// Benchmark display name
    pub benchmark_name: String,

    /// Absolute daily move, in percent, that counts as material
    pub threshold_percent: f64,

    /// Earliest fiscal quarter kept in the financials store
    pub earliest_quarter: FiscalQuarter,

    /// Persisted daily history document
    pub history_path: PathBuf,

    /// Persisted quarterly financials document
    pub financials_path: PathBuf,

    /// Rendered report output
    pub report_path: PathBuf,

    /// Public URL of the published report, used in notifications
    pub dashboard_url: String,

    /// Request timeout for all collaborator calls
    pub request_timeout: Duration,

    /// Slack incoming webhook (optional; required only when notifying)
    pub slack_webhook_url: Option<String>,

    /// Google Custom Search credentials (optional; research degrades without them)
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,

    /// Anthropic credentials for narrative generation (optional; see above)
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,

    /// User-Agent for SEC EDGAR requests (required by their fair-access policy)
    pub sec_user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            companies: vec![
                Company::new("DKNG", "DraftKings")
                    .with_domain("draftkings.com")
                    .with_ir_url("https://investors.draftkings.com"),
                Company::new("FLUT", "Flutter Entertainment")
                    .with_domain("flutter.com")
                    .with_ir_url("https://www.flutter.com/investors"),
                Company::new("CZR", "Caesars Entertainment")
                    .with_domain("caesars.com")
                    .with_ir_url("https://investor.caesars.com"),
                Company::new("MGM", "MGM Resorts")
                    .with_domain("mgmresorts.com")
                    .with_ir_url("https://investors.mgmresorts.com"),
                Company::new("PENN", "Penn Entertainment")
                    .with_domain("pennentertainment.com")
                    .with_ir_url("https://investors.pennentertainment.com"),
                Company::new("RSI", "Rush Street Interactive")
                    .with_domain("rushstreetinteractive.com")
                    .with_ir_url("https://www.rushstreetinteractive.com/investors"),
                Company::new("BALY", "Bally's Corporation")
                    .with_domain("ballys.com")
                    .with_ir_url("https://investors.ballys.com"),
            ],
            benchmark_ticker: "^IXIC".to_string(),
            benchmark_name: "NASDAQ".to_string(),
            threshold_percent: 2.0,
            earliest_quarter: FiscalQuarter { year: 2024, quarter: 1 },
            history_path: PathBuf::from("stock_tracker_history.json"),
            financials_path: PathBuf::from("earnings_data.json"),
            report_path: PathBuf::from("stock_dashboard.html"),
            dashboard_url: "https://adamware-creator.github.io/gaming-stock-tracker/".to_string(),
            request_timeout: Duration::from_secs(30),
            slack_webhook_url: None,
            search_api_key: None,
            search_engine_id: None,
            anthropic_api_key: None,
            anthropic_model: "claude-3-5-sonnet-latest".to_string(),
            sec_user_agent: "gaming-stock-tracker (tracker@example.com)".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Create a new configuration builder
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// Load collaborator credentials from the environment
    ///
    /// Reads SLACK_WEBHOOK_URL, GOOGLE_SEARCH_API_KEY,
    /// GOOGLE_SEARCH_ENGINE_ID, ANTHROPIC_API_KEY, ANTHROPIC_MODEL and
    /// SEC_USER_AGENT. Absent variables leave the config unchanged.
    pub fn with_env_credentials(mut self) -> Self {
        if let Ok(url) = std::env::var("SLACK_WEBHOOK_URL") {
            self.slack_webhook_url = Some(url);
        }
        if let Ok(key) = std::env::var("GOOGLE_SEARCH_API_KEY") {
            self.search_api_key = Some(key);
        }
        if let Ok(id) = std::env::var("GOOGLE_SEARCH_ENGINE_ID") {
            self.search_engine_id = Some(id);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            self.anthropic_model = model;
        }
        if let Ok(ua) = std::env::var("SEC_USER_AGENT") {
            self.sec_user_agent = ua;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.companies.is_empty() {
            return Err(TrackerError::Config(
                "at least one company must be tracked".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for company in &self.companies {
            if !seen.insert(company.ticker.as_str()) {
                return Err(TrackerError::Config(format!(
                    "duplicate ticker in company table: {}",
                    company.ticker
                )));
            }
        }

        if !self.threshold_percent.is_finite() || self.threshold_percent <= 0.0 {
            return Err(TrackerError::Config(format!(
                "threshold_percent must be positive, got {}",
                self.threshold_percent
            )));
        }

        if self.benchmark_ticker.is_empty() {
            return Err(TrackerError::Config(
                "benchmark_ticker must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Look up a tracked company by ticker
    pub fn company(&self, ticker: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.ticker == ticker)
    }

    /// The webhook URL, or a config error when notification was requested
    /// without one
    pub fn require_webhook(&self) -> Result<&str> {
        self.slack_webhook_url
            .as_deref()
            .ok_or_else(|| TrackerError::Config("SLACK_WEBHOOK_URL not set".to_string()))
    }
}

/// Builder for TrackerConfig
#[derive(Debug, Default)]
pub struct TrackerConfigBuilder {
    companies: Option<Vec<Company>>,
    benchmark_ticker: Option<String>,
    benchmark_name: Option<String>,
    threshold_percent: Option<f64>,
    earliest_quarter: Option<FiscalQuarter>,
    data_dir: Option<PathBuf>,
    dashboard_url: Option<String>,
    request_timeout: Option<Duration>,
}

impl TrackerConfigBuilder {
    /// Replace the tracked company table
    pub fn companies(mut self, companies: Vec<Company>) -> Self {
        self.companies = Some(companies);
        self
    }

    /// Set the benchmark ticker and display name
    pub fn benchmark(mut self, ticker: impl Into<String>, name: impl Into<String>) -> Self {
        self.benchmark_ticker = Some(ticker.into());
        self.benchmark_name = Some(name.into());
        self
    }

    /// Set the material-change threshold in percent
    pub fn threshold_percent(mut self, threshold: f64) -> Self {
        self.threshold_percent = Some(threshold);
        self
    }

    /// Set the earliest fiscal quarter to track
    pub fn earliest_quarter(mut self, quarter: FiscalQuarter) -> Self {
        self.earliest_quarter = Some(quarter);
        self
    }

    /// Place all persisted documents and the report under one directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the published dashboard URL used in notifications
    pub fn dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }

    /// Set the collaborator request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TrackerConfig> {
        let defaults = TrackerConfig::default();

        let mut config = TrackerConfig {
            companies: self.companies.unwrap_or(defaults.companies),
            benchmark_ticker: self.benchmark_ticker.unwrap_or(defaults.benchmark_ticker),
            benchmark_name: self.benchmark_name.unwrap_or(defaults.benchmark_name),
            threshold_percent: self.threshold_percent.unwrap_or(defaults.threshold_percent),
            earliest_quarter: self.earliest_quarter.unwrap_or(defaults.earliest_quarter),
            dashboard_url: self.dashboard_url.unwrap_or(defaults.dashboard_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            history_path: defaults.history_path,
            financials_path: defaults.financials_path,
            report_path: defaults.report_path,
            slack_webhook_url: defaults.slack_webhook_url,
            search_api_key: defaults.search_api_key,
            search_engine_id: defaults.search_engine_id,
            anthropic_api_key: defaults.anthropic_api_key,
            anthropic_model: defaults.anthropic_model,
            sec_user_agent: defaults.sec_user_agent,
        };

        if let Some(dir) = self.data_dir {
            config.history_path = dir.join("stock_tracker_history.json");
            config.financials_path = dir.join("earnings_data.json");
            config.report_path = dir.join("stock_dashboard.html");
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.companies.len(), 7);
        assert_eq!(config.benchmark_ticker, "^IXIC");
        assert_eq!(config.threshold_percent, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_company_lookup() {
        let config = TrackerConfig::default();
        let company = config.company("DKNG").unwrap();
        assert_eq!(company.name, "DraftKings");
        assert_eq!(
            company.logo_url().as_deref(),
            Some("https://logo.clearbit.com/draftkings.com")
        );
        assert!(config.company("AAPL").is_none());
    }

    #[test]
    fn test_builder() {
        let config = TrackerConfig::builder()
            .threshold_percent(3.5)
            .benchmark("^GSPC", "S&P 500")
            .data_dir("/tmp/tracker")
            .build()
            .unwrap();

        assert_eq!(config.threshold_percent, 3.5);
        assert_eq!(config.benchmark_name, "S&P 500");
        assert_eq!(
            config.history_path,
            PathBuf::from("/tmp/tracker/stock_tracker_history.json")
        );
    }

    #[test]
    fn test_validation_duplicate_ticker() {
        let config = TrackerConfig::builder()
            .companies(vec![
                Company::new("DKNG", "DraftKings"),
                Company::new("DKNG", "DraftKings again"),
            ])
            .build();
        assert!(config.is_err());
    }

    #[test]
    fn test_validation_bad_threshold() {
        assert!(TrackerConfig::builder().threshold_percent(0.0).build().is_err());
        assert!(TrackerConfig::builder().threshold_percent(-2.0).build().is_err());
    }

    #[test]
    fn test_require_webhook() {
        let config = TrackerConfig::default();
        assert!(matches!(
            config.require_webhook(),
            Err(TrackerError::Config(_))
        ));

        let config = TrackerConfig {
            slack_webhook_url: Some("https://hooks.slack.com/services/T/B/X".to_string()),
            ..TrackerConfig::default()
        };
        assert!(config.require_webhook().is_ok());
    }
}
