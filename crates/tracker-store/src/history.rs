//! The daily history store

use crate::persist;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracker_core::{DayRecord, Narrative, Result, TrackerError};

/// The persisted document shape: `{ "records": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryDoc {
    #[serde(default)]
    records: Vec<DayRecord>,
}

/// Append-only daily history, keyed by calendar date
///
/// At most one record exists per date: merging a record for a date that is
/// already present fully replaces the old record. The document keeps its
/// records sorted by date so rewrites diff cleanly; readers that care
/// about order sort for themselves.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    doc: HistoryDoc,
}

impl HistoryStore {
    /// Open the store at `path`, starting empty when the file does not
    /// exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc: HistoryDoc = persist::load_or_default(&path)?;
        Ok(Self { path, doc })
    }

    /// Merge one day's record, replacing any existing record for the same
    /// date
    ///
    /// Idempotent: merging the same record twice leaves the store exactly
    /// as one merge would.
    pub fn merge(&mut self, record: DayRecord) {
        if let Some(existing) = self.doc.records.iter().position(|r| r.date == record.date) {
            tracing::debug!(date = %record.date, "replacing existing record");
            self.doc.records.remove(existing);
        }
        self.doc.records.push(record);
        self.doc.records.sort_by_key(|r| r.date);
    }

    /// Persist the whole document atomically
    pub fn save(&self) -> Result<()> {
        persist::save_atomic(&self.path, &self.doc)
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.doc.records
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.doc.records.iter().find(|r| r.date == date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    /// The most recent record by date
    pub fn latest(&self) -> Option<&DayRecord> {
        self.doc.records.iter().max_by_key(|r| r.date)
    }

    pub fn len(&self) -> usize {
        self.doc.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.records.is_empty()
    }

    /// Attach a researched narrative to one material change
    ///
    /// This is the supported way to fix up a narrative after the fact; the
    /// change's direction words and search query stay derived from the
    /// stored prices, so a patch can no longer contradict them.
    pub fn apply_narrative_patch(
        &mut self,
        date: NaiveDate,
        ticker: &str,
        text: impl Into<String>,
    ) -> Result<()> {
        let record = self
            .doc
            .records
            .iter_mut()
            .find(|r| r.date == date)
            .ok_or_else(|| TrackerError::NotFound(format!("no record for {date}")))?;

        let change = record.material_change_mut(ticker).ok_or_else(|| {
            TrackerError::NotFound(format!("no material change for {ticker} on {date}"))
        })?;

        change.narrative = Narrative::Final {
            summary: text.into(),
        };
        Ok(())
    }
}
