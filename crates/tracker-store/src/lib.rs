//! Persisted stores for the tracker
//!
//! Two single-document JSON stores: the daily history
//! (`stock_tracker_history.json`) and the quarterly financials
//! (`earnings_data.json`). Each document is read fully, mutated in memory
//! and rewritten fully; writes go to a temporary sibling file that is
//! atomically renamed over the target, so a crash mid-write leaves the
//! previous document intact.
//!
//! Point fixes that used to be one-off scripts rewriting the raw JSON go
//! through the patch APIs here instead, which keep the document's
//! invariants (one record per date, no persisted derived values).

mod financials;
mod history;
mod persist;

pub use financials::{FinancialsPatch, FinancialsStore};
pub use history::HistoryStore;
