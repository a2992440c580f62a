//! The quarterly financials store

use crate::persist;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracker_core::{CompanyFinancials, FiscalQuarter, QuarterlyFinancials, Result, TrackerError};

/// The persisted document shape:
/// `{ "companies": { ticker -> { name, quarters } } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FinancialsDoc {
    #[serde(default)]
    companies: BTreeMap<String, CompanyFinancials>,
}

/// Fields a financials patch may update
///
/// Only raw inputs are patchable; year-over-year deltas are derived at
/// render time and cannot be set at all.
#[derive(Debug, Clone, Default)]
pub struct FinancialsPatch {
    pub revenue: Option<f64>,
    pub earnings: Option<f64>,
    pub presentation_summary: Option<String>,
}

impl FinancialsPatch {
    pub fn is_empty(&self) -> bool {
        self.revenue.is_none() && self.earnings.is_none() && self.presentation_summary.is_none()
    }
}

/// Quarterly financials per company, persisted as one JSON document
#[derive(Debug)]
pub struct FinancialsStore {
    path: PathBuf,
    doc: FinancialsDoc,
}

impl FinancialsStore {
    /// Open the store at `path`, starting empty when the file does not
    /// exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc: FinancialsDoc = persist::load_or_default(&path)?;
        Ok(Self { path, doc })
    }

    /// Persist the whole document atomically
    pub fn save(&self) -> Result<()> {
        persist::save_atomic(&self.path, &self.doc)
    }

    pub fn companies(&self) -> &BTreeMap<String, CompanyFinancials> {
        &self.doc.companies
    }

    pub fn company(&self, ticker: &str) -> Option<&CompanyFinancials> {
        self.doc.companies.get(ticker)
    }

    pub fn is_empty(&self) -> bool {
        self.doc.companies.is_empty()
    }

    /// Merge freshly fetched quarters into a company entry
    ///
    /// Fetched figures replace stored ones, but a presentation summary
    /// already on file survives a refresh that carries none - summaries
    /// are filled in out-of-band and refetching raw figures must not wipe
    /// them.
    pub fn upsert_quarters(
        &mut self,
        ticker: &str,
        name: &str,
        quarters: BTreeMap<FiscalQuarter, QuarterlyFinancials>,
    ) {
        let company = self
            .doc
            .companies
            .entry(ticker.to_string())
            .or_insert_with(|| CompanyFinancials {
                name: name.to_string(),
                quarters: BTreeMap::new(),
            });
        company.name = name.to_string();

        for (quarter, mut incoming) in quarters {
            if let Some(existing) = company.quarters.get(&quarter) {
                if incoming.presentation_summary.is_none() {
                    incoming.presentation_summary = existing.presentation_summary.clone();
                }
            }
            company.quarters.insert(quarter, incoming);
        }
    }

    /// Update raw fields on one company quarter
    pub fn apply_financials_patch(
        &mut self,
        ticker: &str,
        quarter: FiscalQuarter,
        patch: FinancialsPatch,
    ) -> Result<()> {
        let company = self
            .doc
            .companies
            .get_mut(ticker)
            .ok_or_else(|| TrackerError::NotFound(format!("{ticker} not in financials")))?;

        let entry = match company.quarters.get_mut(&quarter) {
            Some(entry) => entry,
            None => {
                let available: Vec<String> =
                    company.quarters.keys().map(ToString::to_string).collect();
                return Err(TrackerError::NotFound(format!(
                    "{quarter} not tracked for {ticker} (have: {})",
                    available.join(", ")
                )));
            }
        };

        if let Some(revenue) = patch.revenue {
            entry.revenue = Some(revenue);
        }
        if let Some(earnings) = patch.earnings {
            entry.earnings = Some(earnings);
        }
        if let Some(summary) = patch.presentation_summary {
            entry.presentation_summary = Some(summary);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(year: i32, quarter: u8) -> FiscalQuarter {
        FiscalQuarter::new(year, quarter).unwrap()
    }

    fn fetched(revenue: f64) -> QuarterlyFinancials {
        QuarterlyFinancials {
            revenue: Some(revenue),
            earnings: Some(revenue / 10.0),
            ..Default::default()
        }
    }

    fn open_temp() -> (tempfile::TempDir, FinancialsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FinancialsStore::open(dir.path().join("earnings.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_upsert_creates_company() {
        let (_dir, mut store) = open_temp();

        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 1), fetched(100.0));
        store.upsert_quarters("DKNG", "DraftKings", quarters);

        let company = store.company("DKNG").unwrap();
        assert_eq!(company.name, "DraftKings");
        assert_eq!(company.quarters[&q(2024, 1)].revenue, Some(100.0));
    }

    #[test]
    fn test_upsert_preserves_summary_on_refresh() {
        let (_dir, mut store) = open_temp();

        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 1), fetched(100.0));
        store.upsert_quarters("DKNG", "DraftKings", quarters);

        store
            .apply_financials_patch(
                "DKNG",
                q(2024, 1),
                FinancialsPatch {
                    presentation_summary: Some("Management highlighted OSB growth.".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        // Refetch with corrected revenue and no summary
        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 1), fetched(110.0));
        store.upsert_quarters("DKNG", "DraftKings", quarters);

        let entry = &store.company("DKNG").unwrap().quarters[&q(2024, 1)];
        assert_eq!(entry.revenue, Some(110.0));
        assert_eq!(
            entry.presentation_summary.as_deref(),
            Some("Management highlighted OSB growth.")
        );
    }

    #[test]
    fn test_patch_after_revenue_fix_changes_yoy() {
        // The stale-YoY failure mode: correct a raw figure and the derived
        // delta must follow, because it is never stored.
        let (_dir, mut store) = open_temp();

        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 1), fetched(100.0));
        quarters.insert(q(2025, 1), fetched(120.0));
        store.upsert_quarters("DKNG", "DraftKings", quarters);

        let company = store.company("DKNG").unwrap();
        assert!((company.revenue_yoy(q(2025, 1)).unwrap() - 20.0).abs() < 1e-9);

        store
            .apply_financials_patch(
                "DKNG",
                q(2025, 1),
                FinancialsPatch {
                    revenue: Some(130.0),
                    ..Default::default()
                },
            )
            .unwrap();

        let company = store.company("DKNG").unwrap();
        assert!((company.revenue_yoy(q(2025, 1)).unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_patch_unknown_targets() {
        let (_dir, mut store) = open_temp();

        let err = store
            .apply_financials_patch("DKNG", q(2024, 1), FinancialsPatch::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 1), fetched(100.0));
        store.upsert_quarters("DKNG", "DraftKings", quarters);

        let err = store
            .apply_financials_patch("DKNG", q(2024, 3), FinancialsPatch::default())
            .unwrap_err();
        assert!(err.to_string().contains("Q1 2024"));
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("earnings.json");

        let mut store = FinancialsStore::open(&path).unwrap();
        let mut quarters = BTreeMap::new();
        quarters.insert(q(2024, 2), fetched(250.0));
        store.upsert_quarters("MGM", "MGM Resorts", quarters);
        store.save().unwrap();

        let reopened = FinancialsStore::open(&path).unwrap();
        assert_eq!(reopened.companies(), store.companies());
    }
}
