//! Core data model for the gaming stock tracker
//!
//! This crate defines the domain types shared across the tracker workspace:
//!
//! - Daily price quotes and percentage-change classification
//! - Day records with their material changes and news narratives
//! - Quarterly financials keyed by fiscal quarter, with derived
//!   year-over-year deltas
//! - The tracker configuration (company table, benchmark, threshold)
//! - The common error type
//!
//! Derived values (percentage change, direction words, display dates,
//! year-over-year deltas) are always computed from the raw fields, never
//! stored alongside them. This keeps a persisted document from carrying a
//! stale copy of something its own inputs contradict.

pub mod config;
pub mod error;
pub mod financials;
pub mod logging;
pub mod quote;
pub mod record;

// Re-export main types for convenience
pub use config::{Company, TrackerConfig};
pub use error::{Result, TrackerError};
pub use financials::{CompanyFinancials, FiscalQuarter, QuarterlyFinancials};
pub use quote::{DailyQuote, Direction, RawBar, normalize};
pub use record::{DayRecord, MaterialChange, Narrative};
