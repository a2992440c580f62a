//! Day records: one day's quotes, material changes and narratives

use crate::config::Company;
use crate::quote::{DailyQuote, Direction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Research state of a material change's news narrative
///
/// A narrative is `Pending` until research is attempted, `Placeholder`
/// when research was skipped or failed (the summary is the auto-templated
/// sentence), and `Final` once a researched or hand-written narrative is
/// attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Narrative {
    Pending,
    Placeholder { summary: String },
    Final { summary: String },
}

impl Narrative {
    /// Whether a human (or a later automated pass) still needs to supply
    /// a real narrative
    pub fn needs_manual_lookup(&self) -> bool {
        !matches!(self, Self::Final { .. })
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Placeholder { summary } | Self::Final { summary } => Some(summary),
        }
    }
}

/// A daily move at or beyond the configured threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialChange {
    pub ticker: String,
    pub name: String,
    pub quote: DailyQuote,
    pub narrative: Narrative,
}

impl MaterialChange {
    pub fn pct_change(&self) -> f64 {
        self.quote.pct_change()
    }

    pub fn direction(&self) -> Direction {
        self.quote.direction()
    }

    /// The news search query for this move
    ///
    /// Derived from the move itself, so the direction word always matches
    /// the sign of the change.
    pub fn search_query(&self, date_display: &str) -> String {
        format!(
            "{} {} stock {} {}",
            self.name,
            self.ticker,
            self.direction().verb_present(),
            date_display
        )
    }

    /// The auto-templated one-line summary used until research completes
    pub fn placeholder_summary(&self, date_display: &str) -> String {
        format!(
            "{} {} {:.1}% on {}.",
            self.name,
            self.direction().verb_past(),
            self.pct_change().abs(),
            date_display
        )
    }
}

/// One analyzed trading day: the unit of history
///
/// Immutable once merged into the store, except for narrative backfill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar date, the canonical key within the store
    pub date: NaiveDate,

    /// Benchmark index quote, when the market produced one
    pub benchmark: Option<DailyQuote>,

    /// Per-company quotes, keyed by ticker
    pub companies: BTreeMap<String, DailyQuote>,

    /// Moves at or beyond the threshold, in company-table order
    pub material_changes: Vec<MaterialChange>,
}

impl DayRecord {
    /// Assemble a record from one day's fetched quotes
    ///
    /// Classifies material changes against the threshold (inclusive) in
    /// the order the quotes are given, which is the configured company
    /// order. Narratives start out `Pending`.
    pub fn build(
        date: NaiveDate,
        benchmark: Option<DailyQuote>,
        quotes: &[(&Company, DailyQuote)],
        threshold_percent: f64,
    ) -> Self {
        let mut companies = BTreeMap::new();
        let mut material_changes = Vec::new();

        for (company, quote) in quotes {
            companies.insert(company.ticker.clone(), *quote);

            if quote.pct_change().abs() >= threshold_percent {
                material_changes.push(MaterialChange {
                    ticker: company.ticker.clone(),
                    name: company.name.clone(),
                    quote: *quote,
                    narrative: Narrative::Pending,
                });
            }
        }

        Self {
            date,
            benchmark,
            companies,
            material_changes,
        }
    }

    /// Human-readable date, e.g. "December 04, 2025"
    pub fn date_display(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }

    /// Whether no company produced any data for this day
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// The material change for a ticker, if the day had one
    pub fn material_change(&self, ticker: &str) -> Option<&MaterialChange> {
        self.material_changes.iter().find(|c| c.ticker == ticker)
    }

    /// Mutable access for narrative backfill
    pub fn material_change_mut(&mut self, ticker: &str) -> Option<&mut MaterialChange> {
        self.material_changes.iter_mut().find(|c| c.ticker == ticker)
    }
}
