//! Daily update orchestration
//!
//! One invocation runs the strictly sequential batch: fetch quotes for the
//! benchmark and every configured company, classify material changes,
//! research narratives, merge the day into the history store, rewrite the
//! report, and optionally notify the webhook.
//!
//! Degradation policy: one company's fetch failure never blocks the others
//! or the merge; a missing or failing search/generation collaborator
//! degrades that narrative to its placeholder; a notification failure is
//! logged and swallowed. Only persistence and configuration errors abort
//! an invocation.

use chrono::{Datelike, Duration, Local, NaiveDate};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracker_core::{
    DailyQuote, DayRecord, MaterialChange, Narrative, Result, TrackerConfig, TrackerError,
    normalize,
};
use tracker_providers::{
    FinancialsProvider, MarketData, NarrativeGenerator, Notifier, SearchProvider, daily_summary,
};
use tracker_report::ReportRenderer;
use tracker_store::{FinancialsStore, HistoryStore};

/// Search results fed to the generator per material change
const SEARCH_RESULTS_PER_CHANGE: usize = 5;

/// Options for one daily update run
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Target date; defaults to yesterday in local time
    pub date: Option<NaiveDate>,
    /// Leave placeholder narratives instead of researching
    pub skip_research: bool,
    /// Send the daily summary to the webhook after merging
    pub notify: bool,
}

/// The fetch -> merge -> render -> notify pipeline
pub struct Pipeline {
    config: TrackerConfig,
    market: Arc<dyn MarketData>,
    search: Option<Arc<dyn SearchProvider>>,
    generator: Option<Arc<dyn NarrativeGenerator>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Pipeline {
    pub fn new(config: TrackerConfig, market: Arc<dyn MarketData>) -> Self {
        Self {
            config,
            market,
            search: None,
            generator: None,
            notifier: None,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn NarrativeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Fetch and assemble one day's record
    ///
    /// Returns `Ok(None)` when no company produced data - a market-wide
    /// holiday - in which case the day is omitted from history entirely.
    pub async fn analyze_day(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
        ensure_market_closed(date, Local::now().date_naive())?;

        info!(date = %date, "analyzing");

        let benchmark = self
            .fetch_quote(&self.config.benchmark_ticker, date)
            .await;

        let mut quotes = Vec::new();
        for company in &self.config.companies {
            if let Some(quote) = self.fetch_quote(&company.ticker, date).await {
                quotes.push((company, quote));
            }
        }

        if quotes.is_empty() {
            info!(date = %date, "no company data; treating as market holiday");
            return Ok(None);
        }

        let record = DayRecord::build(date, benchmark, &quotes, self.config.threshold_percent);
        info!(
            date = %date,
            companies = record.companies.len(),
            material_changes = record.material_changes.len(),
            "assembled day record"
        );

        Ok(Some(record))
    }

    /// Fetch and normalize one ticker's quote, degrading any failure to
    /// absent so the rest of the batch proceeds
    async fn fetch_quote(&self, ticker: &str, date: NaiveDate) -> Option<DailyQuote> {
        let window = match self.market.daily_window(ticker, date).await {
            Ok(window) => window,
            Err(e) => {
                warn!(ticker, %e, "fetch failed; skipping");
                return None;
            }
        };

        match normalize(ticker, date, &window) {
            Ok(quote) => quote,
            Err(e) => {
                warn!(ticker, %e, "bad quote; skipping");
                None
            }
        }
    }

    /// Attach narratives to every material change in the record
    ///
    /// Each change gets a researched `Final` narrative when both
    /// collaborators are configured and succeed, and its templated
    /// `Placeholder` otherwise.
    pub async fn research(&self, record: &mut DayRecord) {
        let date_display = record.date_display();

        for change in &mut record.material_changes {
            change.narrative = match (&self.search, &self.generator) {
                (Some(search), Some(generator)) => {
                    research_change(search.as_ref(), generator.as_ref(), change, &date_display)
                        .await
                }
                _ => {
                    warn!(
                        ticker = %change.ticker,
                        "research collaborators not configured; using placeholder"
                    );
                    placeholder(change, &date_display)
                }
            };
        }
    }

    /// Set placeholder narratives without any collaborator calls
    pub fn placeholder_narratives(&self, record: &mut DayRecord) {
        let date_display = record.date_display();
        for change in &mut record.material_changes {
            change.narrative = placeholder(change, &date_display);
        }
    }

    /// Run one full daily update
    ///
    /// Returns the merged record, or `None` for a market holiday.
    pub async fn run_daily(
        &self,
        history: &mut HistoryStore,
        options: UpdateOptions,
    ) -> Result<Option<DayRecord>> {
        let date = options
            .date
            .unwrap_or_else(|| Local::now().date_naive() - Duration::days(1));

        let Some(mut record) = self.analyze_day(date).await? else {
            return Ok(None);
        };

        if options.skip_research {
            self.placeholder_narratives(&mut record);
        } else {
            self.research(&mut record).await;
        }

        history.merge(record.clone());
        history.save()?;

        let report = self.render_report(history)?;
        info!(report = %report.display(), "report rewritten");

        if options.notify {
            self.notify_day(&record).await?;
        }

        Ok(Some(record))
    }

    /// Send the daily summary for a record to the webhook
    ///
    /// Requires a configured notifier; delivery failure itself is logged
    /// and swallowed.
    pub async fn notify_day(&self, record: &DayRecord) -> Result<()> {
        let Some(notifier) = &self.notifier else {
            return Err(TrackerError::Config(
                "notification requested but no webhook configured".to_string(),
            ));
        };

        let message = daily_summary(
            record,
            &self.config.benchmark_name,
            self.config.threshold_percent,
            &self.config.dashboard_url,
        );

        match notifier.notify(&message).await {
            Ok(()) => info!(date = %record.date, "daily summary sent"),
            Err(e) => warn!(%e, "notification failed"),
        }
        Ok(())
    }

    /// Analyze the last `days` calendar days that are not yet in history
    ///
    /// Weekends are skipped outright; holidays fall out naturally as
    /// all-absent days. Narratives stay as placeholders - researching
    /// weeks-old moves is a manual decision. Oldest first, saving after
    /// each day, so an interrupted backfill keeps its progress.
    pub async fn backfill(&self, history: &mut HistoryStore, days: u32) -> Result<usize> {
        self.backfill_from(history, Local::now().date_naive(), days)
            .await
    }

    pub async fn backfill_from(
        &self,
        history: &mut HistoryStore,
        today: NaiveDate,
        days: u32,
    ) -> Result<usize> {
        let mut analyzed = 0;

        for offset in (1..=i64::from(days)).rev() {
            let date = today - Duration::days(offset);

            if date.weekday().number_from_monday() > 5 {
                continue;
            }
            if history.contains(date) {
                continue;
            }

            if let Some(mut record) = self.analyze_day(date).await? {
                self.placeholder_narratives(&mut record);
                history.merge(record);
                history.save()?;
                analyzed += 1;
            }
        }

        info!(analyzed, "backfill complete");
        Ok(analyzed)
    }

    /// Refresh quarterly financials for every configured company
    ///
    /// One company's failure never blocks the rest; the store is saved
    /// after each company like the history backfill.
    pub async fn refresh_financials(
        &self,
        provider: &dyn FinancialsProvider,
        store: &mut FinancialsStore,
    ) -> Result<()> {
        for company in &self.config.companies {
            let quarters = match provider.quarterly_financials(&company.ticker).await {
                Ok(quarters) => quarters,
                Err(e) => {
                    warn!(ticker = %company.ticker, %e, "financials fetch failed; skipping");
                    continue;
                }
            };

            let kept: std::collections::BTreeMap<_, _> = quarters
                .into_iter()
                .filter(|(quarter, _)| *quarter >= self.config.earliest_quarter)
                .collect();

            info!(ticker = %company.ticker, quarters = kept.len(), "financials fetched");
            store.upsert_quarters(&company.ticker, &company.name, kept);
            store.save()?;
        }

        Ok(())
    }

    /// Rewrite the report from the persisted stores
    pub fn render_report(&self, history: &HistoryStore) -> Result<PathBuf> {
        let financials = FinancialsStore::open(&self.config.financials_path)?;
        let renderer = ReportRenderer::new(self.config.clone());
        let html = renderer.render(history.records(), financials.companies())?;

        fs::write(&self.config.report_path, html)
            .map_err(|e| TrackerError::persistence(self.config.report_path.display(), e))?;

        Ok(self.config.report_path.clone())
    }
}

/// A day can only be analyzed once its market has closed: the target must
/// be strictly before today's calendar date
pub fn ensure_market_closed(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date >= today {
        return Err(TrackerError::InvalidDate {
            date,
            reason: "market has not closed yet".to_string(),
        });
    }
    Ok(())
}

async fn research_change(
    search: &dyn SearchProvider,
    generator: &dyn NarrativeGenerator,
    change: &MaterialChange,
    date_display: &str,
) -> Narrative {
    let query = change.search_query(date_display);
    info!(ticker = %change.ticker, %query, "researching");

    let results = match search.search(&query, SEARCH_RESULTS_PER_CHANGE).await {
        Ok(results) => {
            if results.is_empty() {
                warn!(ticker = %change.ticker, "no search results");
            }
            results
        }
        Err(e) => {
            warn!(ticker = %change.ticker, %e, "search failed");
            Vec::new()
        }
    };

    let prompt = research_prompt(change, date_display);
    match generator.generate(&prompt, &results).await {
        Ok(Some(text)) => Narrative::Final { summary: text },
        Ok(None) => {
            warn!(ticker = %change.ticker, "generator returned no narrative");
            placeholder(change, date_display)
        }
        Err(e) => {
            warn!(ticker = %change.ticker, %e, "generation failed");
            placeholder(change, date_display)
        }
    }
}

fn placeholder(change: &MaterialChange, date_display: &str) -> Narrative {
    Narrative::Placeholder {
        summary: change.placeholder_summary(date_display),
    }
}

/// The generation prompt for one material change
///
/// The direction verb and magnitude come from the quote itself, so the
/// requested narrative cannot contradict the move it explains.
fn research_prompt(change: &MaterialChange, date_display: &str) -> String {
    let verb = change.direction().verb_past();
    format!(
        "Based on the web search results provided, write a concise 2-3 sentence news \
         narrative explaining why {name} ({ticker}) stock {verb} {pct:.1}% on {date} \
         to close at ${close:.2}.\n\
         \n\
         Requirements:\n\
         - Use past tense and {verb} (not rises/drops)\n\
         - Include specific catalysts: analyst actions, earnings news, competitive \
         developments, regulatory changes, or market events\n\
         - Mention stock performance context (YTD, vs 52-week high, etc.) if relevant\n\
         - Keep it factual and concise\n\
         - Write in third person\n\
         \n\
         Write only the narrative, no introduction or explanation.",
        name = change.name,
        ticker = change.ticker,
        pct = change.pct_change().abs(),
        date = date_display,
        close = change.quote.close,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::always;
    use std::collections::BTreeMap;
    use tracker_core::{Company, FiscalQuarter, QuarterlyFinancials, RawBar};
    use tracker_providers::{SearchResult, SlackMessage};

    mock! {
        pub Market {}

        #[async_trait]
        impl MarketData for Market {
            async fn daily_window(&self, ticker: &str, date: NaiveDate) -> Result<Vec<RawBar>>;
        }
    }

    mock! {
        pub Search {}

        #[async_trait]
        impl SearchProvider for Search {
            async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
        }
    }

    mock! {
        pub Generator {}

        #[async_trait]
        impl NarrativeGenerator for Generator {
            async fn generate(
                &self,
                prompt: &str,
                context: &[SearchResult],
            ) -> Result<Option<String>>;
        }
    }

    mock! {
        pub Sink {}

        #[async_trait]
        impl Notifier for Sink {
            async fn notify(&self, message: &SlackMessage) -> Result<()>;
        }
    }

    mock! {
        pub Fin {}

        #[async_trait]
        impl FinancialsProvider for Fin {
            async fn quarterly_financials(
                &self,
                ticker: &str,
            ) -> Result<BTreeMap<FiscalQuarter, QuarterlyFinancials>>;
        }
    }

    const DATE: &str = "2025-12-04";

    fn date() -> NaiveDate {
        DATE.parse().unwrap()
    }

    fn bar(open: f64, close: f64) -> RawBar {
        RawBar {
            date: date(),
            open,
            close,
            volume: 1_000_000,
        }
    }

    fn two_company_config(dir: &std::path::Path) -> TrackerConfig {
        TrackerConfig::builder()
            .companies(vec![
                Company::new("DKNG", "DraftKings"),
                Company::new("MGM", "MGM Resorts"),
            ])
            .data_dir(dir)
            .build()
            .unwrap()
    }

    fn market_returning(bars: Vec<(&'static str, Vec<RawBar>)>) -> MockMarket {
        let mut market = MockMarket::new();
        for (ticker, window) in bars {
            market
                .expect_daily_window()
                .withf(move |t, _| t == ticker)
                .returning(move |_, _| Ok(window.clone()));
        }
        market
    }

    #[tokio::test]
    async fn test_analyze_day_assembles_record() {
        let dir = tempfile::tempdir().unwrap();
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 103.0)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);

        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market));
        let record = pipeline.analyze_day(date()).await.unwrap().unwrap();

        assert!(record.benchmark.is_some());
        assert_eq!(record.companies.len(), 2);
        assert_eq!(record.material_changes.len(), 1);
        assert_eq!(record.material_changes[0].ticker, "DKNG");
    }

    #[tokio::test]
    async fn test_one_ticker_failure_does_not_block_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut market = MockMarket::new();
        market
            .expect_daily_window()
            .withf(|t, _| t == "DKNG")
            .returning(|_, _| {
                Err(TrackerError::NoData {
                    symbol: "DKNG".into(),
                    reason: "delisted".into(),
                })
            });
        market
            .expect_daily_window()
            .with(always(), always())
            .returning(|_, _| Ok(vec![bar(50.0, 51.5)]));

        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market));
        let record = pipeline.analyze_day(date()).await.unwrap().unwrap();

        assert!(!record.companies.contains_key("DKNG"));
        assert!(record.companies.contains_key("MGM"));
    }

    #[tokio::test]
    async fn test_all_absent_day_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let mut market = MockMarket::new();
        market
            .expect_daily_window()
            .with(always(), always())
            .returning(|_, _| Ok(vec![]));

        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market));
        let record = pipeline.analyze_day(date()).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_market_closed_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let market = MockMarket::new();
        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market));

        let err = pipeline
            .analyze_day("9999-01-01".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidDate { .. }));
    }

    #[test]
    fn test_ensure_market_closed() {
        let today: NaiveDate = "2025-12-05".parse().unwrap();
        assert!(ensure_market_closed("2025-12-04".parse().unwrap(), today).is_ok());
        assert!(ensure_market_closed(today, today).is_err());
        assert!(ensure_market_closed("2025-12-06".parse().unwrap(), today).is_err());
    }

    #[tokio::test]
    async fn test_research_produces_final_narrative() {
        let dir = tempfile::tempdir().unwrap();
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 103.0)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);

        let mut search = MockSearch::new();
        search.expect_search().returning(|_, _| {
            Ok(vec![SearchResult {
                title: "DraftKings jumps".into(),
                snippet: "snippet".into(),
                url: "https://example.com".into(),
            }])
        });

        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt, context| prompt.contains("rose 3.0%") && context.len() == 1)
            .returning(|_, _| Ok(Some("DraftKings rose 3.0% on upbeat news.".into())));

        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market))
            .with_search(Arc::new(search))
            .with_generator(Arc::new(generator));

        let mut record = pipeline.analyze_day(date()).await.unwrap().unwrap();
        pipeline.research(&mut record).await;

        let narrative = &record.material_changes[0].narrative;
        assert_eq!(
            narrative.summary(),
            Some("DraftKings rose 3.0% on upbeat news.")
        );
        assert!(!narrative.needs_manual_lookup());
    }

    #[tokio::test]
    async fn test_research_degrades_to_placeholder_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 96.5)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);

        let mut search = MockSearch::new();
        search
            .expect_search()
            .returning(|_, _| Err(TrackerError::collaborator("google-search", "HTTP 403")));

        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(TrackerError::collaborator("anthropic", "HTTP 529")));

        let pipeline = Pipeline::new(two_company_config(dir.path()), Arc::new(market))
            .with_search(Arc::new(search))
            .with_generator(Arc::new(generator));

        let mut record = pipeline.analyze_day(date()).await.unwrap().unwrap();
        pipeline.research(&mut record).await;

        let narrative = &record.material_changes[0].narrative;
        assert!(narrative.needs_manual_lookup());
        // Placeholder wording agrees with the sign of the move
        assert_eq!(
            narrative.summary(),
            Some("DraftKings fell 3.5% on December 04, 2025.")
        );
    }

    #[tokio::test]
    async fn test_run_daily_merges_and_renders() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 103.0)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);

        let mut history = HistoryStore::open(&config.history_path).unwrap();
        let pipeline = Pipeline::new(config.clone(), Arc::new(market));

        let record = pipeline
            .run_daily(
                &mut history,
                UpdateOptions {
                    date: Some(date()),
                    skip_research: true,
                    notify: false,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.material_changes.len(), 1);

        // History persisted and report rewritten
        let reopened = HistoryStore::open(&config.history_path).unwrap();
        assert_eq!(reopened.len(), 1);
        let html = fs::read_to_string(&config.report_path).unwrap();
        assert!(html.contains("December 04, 2025"));
    }

    #[tokio::test]
    async fn test_run_daily_refetch_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let mut history = HistoryStore::open(&config.history_path).unwrap();

        // First fetch: DKNG -3.5%
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 96.5)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);
        let pipeline = Pipeline::new(config.clone(), Arc::new(market));
        let options = UpdateOptions {
            date: Some(date()),
            skip_research: true,
            notify: false,
        };
        pipeline.run_daily(&mut history, options.clone()).await.unwrap();

        // Corrected fetch: DKNG +1.0%, below threshold
        let market = market_returning(vec![
            ("^IXIC", vec![bar(21000.0, 21105.0)]),
            ("DKNG", vec![bar(100.0, 101.0)]),
            ("MGM", vec![bar(50.0, 50.2)]),
        ]);
        let pipeline = Pipeline::new(config.clone(), Arc::new(market));
        pipeline.run_daily(&mut history, options).await.unwrap();

        assert_eq!(history.len(), 1);
        let day = history.get(date()).unwrap();
        let quote = day.companies.get("DKNG").unwrap();
        assert!((quote.pct_change() - 1.0).abs() < 1e-9);
        assert!(day.material_change("DKNG").is_none());
    }

    #[tokio::test]
    async fn test_notify_without_webhook_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let market = MockMarket::new();
        let pipeline = Pipeline::new(config, Arc::new(market));

        let company = Company::new("DKNG", "DraftKings");
        let quote = DailyQuote::new("DKNG", 100.0, 103.0, 1_000).unwrap();
        let record = DayRecord::build(date(), None, &[(&company, quote)], 2.0);

        let err = pipeline.notify_day(&record).await.unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[tokio::test]
    async fn test_notify_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());

        let mut sink = MockSink::new();
        sink.expect_notify()
            .returning(|_| Err(TrackerError::collaborator("slack", "HTTP 500")));

        let pipeline =
            Pipeline::new(config, Arc::new(MockMarket::new())).with_notifier(Arc::new(sink));

        let company = Company::new("DKNG", "DraftKings");
        let quote = DailyQuote::new("DKNG", 100.0, 103.0, 1_000).unwrap();
        let record = DayRecord::build(date(), None, &[(&company, quote)], 2.0);

        assert!(pipeline.notify_day(&record).await.is_ok());
    }

    #[tokio::test]
    async fn test_backfill_skips_weekends_and_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let mut history = HistoryStore::open(&config.history_path).unwrap();

        let mut market = MockMarket::new();
        market
            .expect_daily_window()
            .with(always(), always())
            .returning(|_, d| {
                Ok(vec![RawBar {
                    date: d,
                    open: 100.0,
                    close: 101.0,
                    volume: 1_000,
                }])
            });

        let pipeline = Pipeline::new(config, Arc::new(market));

        // Monday 2025-12-08 as "today": the prior 7 calendar days hold
        // exactly five weekdays (Mon 1st - Fri 5th)
        let today: NaiveDate = "2025-12-08".parse().unwrap();
        let analyzed = pipeline
            .backfill_from(&mut history, today, 7)
            .await
            .unwrap();
        assert_eq!(analyzed, 5);
        assert_eq!(history.len(), 5);

        // Second run finds everything already stored
        let analyzed = pipeline
            .backfill_from(&mut history, today, 7)
            .await
            .unwrap();
        assert_eq!(analyzed, 0);
    }

    #[tokio::test]
    async fn test_refresh_financials_filters_old_quarters() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let mut store = FinancialsStore::open(&config.financials_path).unwrap();

        let mut provider = MockFin::new();
        provider.expect_quarterly_financials().returning(|_| {
            let mut quarters = BTreeMap::new();
            quarters.insert(
                FiscalQuarter::new(2023, 4).unwrap(),
                QuarterlyFinancials {
                    revenue: Some(90.0e9),
                    ..Default::default()
                },
            );
            quarters.insert(
                FiscalQuarter::new(2024, 1).unwrap(),
                QuarterlyFinancials {
                    revenue: Some(100.0e9),
                    ..Default::default()
                },
            );
            Ok(quarters)
        });

        let pipeline = Pipeline::new(config, Arc::new(MockMarket::new()));
        pipeline
            .refresh_financials(&provider, &mut store)
            .await
            .unwrap();

        let company = store.company("DKNG").unwrap();
        assert_eq!(company.quarters.len(), 1);
        assert!(
            company
                .quarters
                .contains_key(&FiscalQuarter::new(2024, 1).unwrap())
        );
    }

    #[tokio::test]
    async fn test_refresh_financials_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = two_company_config(dir.path());
        let mut store = FinancialsStore::open(&config.financials_path).unwrap();

        let mut provider = MockFin::new();
        provider
            .expect_quarterly_financials()
            .withf(|t| t == "DKNG")
            .returning(|_| Err(TrackerError::collaborator("sec-edgar", "HTTP 503")));
        provider
            .expect_quarterly_financials()
            .withf(|t| t == "MGM")
            .returning(|_| {
                let mut quarters = BTreeMap::new();
                quarters.insert(
                    FiscalQuarter::new(2024, 1).unwrap(),
                    QuarterlyFinancials {
                        revenue: Some(4.0e9),
                        ..Default::default()
                    },
                );
                Ok(quarters)
            });

        let pipeline = Pipeline::new(config, Arc::new(MockMarket::new()));
        pipeline
            .refresh_financials(&provider, &mut store)
            .await
            .unwrap();

        assert!(store.company("DKNG").is_none());
        assert!(store.company("MGM").is_some());
    }
}
