//! Deterministic static report renderer
//!
//! Turns the persisted daily history and quarterly financials into one
//! self-contained HTML document with two views: material changes by day,
//! and an earnings grid per company. Given identical inputs the output is
//! byte-for-byte identical - nothing here reads a clock, and every
//! collection is iterated in a defined order - so report regenerations can
//! be diffed meaningfully.

use minijinja::Environment;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracker_core::{CompanyFinancials, DayRecord, FiscalQuarter, Result, TrackerConfig, TrackerError};

const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.html");

/// Report renderer
pub struct ReportRenderer {
    config: TrackerConfig,
}

#[derive(Debug, Serialize)]
struct ReportView {
    company_count: usize,
    threshold: f64,
    benchmark_name: String,
    days_tracked: usize,
    oldest_date: String,
    newest_date: String,
    companies: Vec<CompanyItem>,
    days: Vec<DayView>,
    earnings: EarningsView,
}

#[derive(Debug, Serialize)]
struct CompanyItem {
    ticker: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct DayView {
    date_display: String,
    benchmark: Option<BenchmarkView>,
    changes: Vec<ChangeView>,
}

#[derive(Debug, Serialize)]
struct BenchmarkView {
    close: f64,
    pct: f64,
    positive: bool,
}

#[derive(Debug, Serialize)]
struct ChangeView {
    ticker: String,
    name: String,
    logo_url: Option<String>,
    open: f64,
    close: f64,
    pct: f64,
    positive: bool,
    direction_label: &'static str,
    summary: Option<String>,
    needs_lookup: bool,
    search_url: String,
}

#[derive(Debug, Serialize)]
struct EarningsView {
    has_data: bool,
    industry: Option<IndustryView>,
    companies: Vec<CompanyEarningsView>,
}

#[derive(Debug, Serialize)]
struct IndustryView {
    quarter: String,
    company_count: usize,
}

#[derive(Debug, Serialize)]
struct CompanyEarningsView {
    index: usize,
    ticker: String,
    name: String,
    logo_url: Option<String>,
    ir_url: Option<String>,
    years: Vec<YearView>,
}

#[derive(Debug, Serialize)]
struct YearView {
    year: i32,
    cards: Vec<QuarterCard>,
}

#[derive(Debug, Serialize)]
struct QuarterCard {
    label: String,
    present: bool,
    revenue: Option<f64>,
    earnings: Option<f64>,
    revenue_yoy: Option<f64>,
    earnings_yoy: Option<f64>,
    summary: Option<String>,
}

impl ReportRenderer {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Render the full report document
    pub fn render(
        &self,
        records: &[DayRecord],
        financials: &BTreeMap<String, CompanyFinancials>,
    ) -> Result<String> {
        let view = self.build_view(records, financials);

        let mut env = Environment::new();
        env.add_filter("money", money);
        env.add_filter("usd", usd);
        env.add_filter("pct", pct);
        env.add_filter("pct1", pct1);
        env.add_template("dashboard.html", DASHBOARD_TEMPLATE)
            .map_err(|e| TrackerError::Render(e.to_string()))?;

        let template = env
            .get_template("dashboard.html")
            .map_err(|e| TrackerError::Render(e.to_string()))?;

        template
            .render(minijinja::value::Value::from_serialize(&view))
            .map_err(|e| TrackerError::Render(e.to_string()))
    }

    fn build_view(
        &self,
        records: &[DayRecord],
        financials: &BTreeMap<String, CompanyFinancials>,
    ) -> ReportView {
        // Most recent day first
        let mut ordered: Vec<&DayRecord> = records.iter().collect();
        ordered.sort_by(|a, b| b.date.cmp(&a.date));

        let days: Vec<DayView> = ordered.iter().map(|r| self.day_view(r)).collect();

        ReportView {
            company_count: self.config.companies.len(),
            threshold: self.config.threshold_percent,
            benchmark_name: self.config.benchmark_name.clone(),
            days_tracked: ordered.len(),
            oldest_date: ordered
                .last()
                .map(|r| r.date_display())
                .unwrap_or_else(|| "N/A".to_string()),
            newest_date: ordered
                .first()
                .map(|r| r.date_display())
                .unwrap_or_else(|| "N/A".to_string()),
            companies: self
                .config
                .companies
                .iter()
                .map(|c| CompanyItem {
                    ticker: c.ticker.clone(),
                    name: c.name.clone(),
                })
                .collect(),
            days,
            earnings: self.earnings_view(financials),
        }
    }

    fn day_view(&self, record: &DayRecord) -> DayView {
        let date_display = record.date_display();

        let changes = record
            .material_changes
            .iter()
            .map(|change| {
                let pct = change.pct_change();
                ChangeView {
                    ticker: change.ticker.clone(),
                    name: change.name.clone(),
                    logo_url: self
                        .config
                        .company(&change.ticker)
                        .and_then(|c| c.logo_url()),
                    open: change.quote.open,
                    close: change.quote.close,
                    pct,
                    positive: pct > 0.0,
                    direction_label: if pct > 0.0 { "UP" } else { "DOWN" },
                    summary: change.narrative.summary().map(ToString::to_string),
                    needs_lookup: change.narrative.needs_manual_lookup(),
                    search_url: search_url(&change.search_query(&date_display)),
                }
            })
            .collect();

        DayView {
            benchmark: record.benchmark.map(|quote| {
                let pct = quote.pct_change();
                BenchmarkView {
                    close: quote.close,
                    pct,
                    positive: pct > 0.0,
                }
            }),
            date_display,
            changes,
        }
    }

    fn earnings_view(&self, financials: &BTreeMap<String, CompanyFinancials>) -> EarningsView {
        // One aligned column per year seen anywhere in the table, so gaps
        // in one company's quarter grid stay visible
        let years: BTreeSet<i32> = financials
            .values()
            .flat_map(|c| c.quarters.keys().map(|q| q.year))
            .collect();

        let mut companies = Vec::new();
        for company in &self.config.companies {
            let Some(entry) = financials.get(&company.ticker) else {
                continue;
            };
            if entry.quarters.is_empty() {
                continue;
            }

            let year_views: Vec<YearView> = years
                .iter()
                .map(|&year| YearView {
                    year,
                    cards: (1..=4)
                        .map(|q| quarter_card(entry, FiscalQuarter { year, quarter: q }))
                        .collect(),
                })
                .collect();

            companies.push(CompanyEarningsView {
                index: companies.len() + 1,
                ticker: company.ticker.clone(),
                name: entry.name.clone(),
                logo_url: company.logo_url(),
                ir_url: company.ir_url.clone(),
                years: year_views,
            });
        }

        EarningsView {
            has_data: !companies.is_empty(),
            industry: industry_view(financials),
            companies,
        }
    }
}

fn quarter_card(company: &CompanyFinancials, quarter: FiscalQuarter) -> QuarterCard {
    let label = quarter.to_string();
    match company.quarters.get(&quarter) {
        None => QuarterCard {
            label,
            present: false,
            revenue: None,
            earnings: None,
            revenue_yoy: None,
            earnings_yoy: None,
            summary: None,
        },
        Some(entry) => QuarterCard {
            label,
            present: true,
            revenue: entry.revenue,
            earnings: entry.earnings,
            revenue_yoy: company.revenue_yoy(quarter),
            earnings_yoy: company.earnings_yoy(quarter),
            summary: entry.presentation_summary.clone(),
        },
    }
}

/// The most recent quarter with at least one presentation summary filed,
/// and how many companies filed one - a pure fold over the table
fn industry_view(financials: &BTreeMap<String, CompanyFinancials>) -> Option<IndustryView> {
    let quarter = financials
        .values()
        .flat_map(|c| {
            c.quarters
                .iter()
                .filter(|(_, entry)| entry.presentation_summary.is_some())
                .map(|(q, _)| *q)
        })
        .max()?;

    let company_count = financials
        .values()
        .filter(|c| {
            c.quarters
                .get(&quarter)
                .is_some_and(|entry| entry.presentation_summary.is_some())
        })
        .count();

    Some(IndustryView {
        quarter: quarter.to_string(),
        company_count,
    })
}

fn search_url(query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://www.google.com/search?q={encoded}")
}

/// Format currency in human-readable form
fn money(amount: f64) -> String {
    let abs_amount = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };

    if abs_amount >= 1_000_000_000_000.0 {
        format!("{}${:.2}T", sign, abs_amount / 1_000_000_000_000.0)
    } else if abs_amount >= 1_000_000_000.0 {
        format!("{}${:.2}B", sign, abs_amount / 1_000_000_000.0)
    } else if abs_amount >= 1_000_000.0 {
        format!("{}${:.2}M", sign, abs_amount / 1_000_000.0)
    } else if abs_amount >= 1_000.0 {
        format!("{}${:.2}K", sign, abs_amount / 1_000.0)
    } else {
        format!("{sign}${abs_amount:.2}")
    }
}

/// Share price, two decimals
fn usd(value: f64) -> String {
    format!("${value:.2}")
}

/// Signed percentage, two decimals
fn pct(value: f64) -> String {
    format!("{value:+.2}%")
}

/// Signed percentage, one decimal
fn pct1(value: f64) -> String {
    format!("{value:+.1}%")
}
