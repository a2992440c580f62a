//! Quarterly financials keyed by fiscal quarter
//!
//! Year-over-year deltas are computed on demand from the raw revenue and
//! earnings figures. The original data file carried stored YoY values that
//! went stale whenever a raw figure was corrected; here there is simply
//! nothing to go stale.

use crate::error::{Result, TrackerError};
use chrono::{Datelike, NaiveDate};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A fiscal quarter, displayed as "Q3 2025"
///
/// Ordered by (year, quarter) so "most recent quarter" comparisons are
/// chronological, not lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalQuarter {
    pub year: i32,
    pub quarter: u8,
}

impl FiscalQuarter {
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(TrackerError::NotFound(format!(
                "quarter must be 1-4, got {quarter}"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// The quarter a calendar date falls in
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month0() / 3) + 1) as u8,
        }
    }

    /// The same quarter one year earlier
    pub fn prior_year(&self) -> Self {
        Self {
            year: self.year - 1,
            quarter: self.quarter,
        }
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

impl FromStr for FiscalQuarter {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TrackerError::NotFound(format!("invalid quarter key: {s:?}"));

        let mut parts = s.split_whitespace();
        let q = parts.next().ok_or_else(invalid)?;
        let year = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let quarter: u8 = q
            .strip_prefix('Q')
            .and_then(|n| n.parse().ok())
            .ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        Self::new(year, quarter)
    }
}

// Serialized as its display string so it can key a JSON object.
impl Serialize for FiscalQuarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FiscalQuarter {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct QuarterVisitor;

        impl Visitor<'_> for QuarterVisitor {
            type Value = FiscalQuarter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a quarter key like \"Q1 2024\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                v.parse().map_err(|e: TrackerError| E::custom(e.to_string()))
            }
        }

        deserializer.deserialize_str(QuarterVisitor)
    }
}

/// Reported figures for one company in one fiscal quarter
///
/// Revenue and earnings are nullable because not every source reports
/// both. No derived field is persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuarterlyFinancials {
    /// Period end date, when the source reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,

    /// Total revenue in currency units
    #[serde(default)]
    pub revenue: Option<f64>,

    /// Net income in currency units
    #[serde(default)]
    pub earnings: Option<f64>,

    /// Management presentation summary, filled in out-of-band
    #[serde(default)]
    pub presentation_summary: Option<String>,
}

/// All tracked quarters for one company
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyFinancials {
    pub name: String,
    #[serde(default)]
    pub quarters: BTreeMap<FiscalQuarter, QuarterlyFinancials>,
}

impl CompanyFinancials {
    /// Revenue change versus the same quarter one year earlier, in percent
    ///
    /// `None` when either quarter or its revenue is missing, or the prior
    /// revenue is exactly zero.
    pub fn revenue_yoy(&self, quarter: FiscalQuarter) -> Option<f64> {
        let current = self.quarters.get(&quarter)?.revenue?;
        let prior = self.quarters.get(&quarter.prior_year())?.revenue?;
        if prior == 0.0 {
            return None;
        }
        Some((current - prior) / prior * 100.0)
    }

    /// Earnings change versus the same quarter one year earlier, in percent
    ///
    /// The denominator is the prior value's magnitude so a swing from a
    /// loss to a profit reads as positive.
    pub fn earnings_yoy(&self, quarter: FiscalQuarter) -> Option<f64> {
        let current = self.quarters.get(&quarter)?.earnings?;
        let prior = self.quarters.get(&quarter.prior_year())?.earnings?;
        if prior == 0.0 {
            return None;
        }
        Some((current - prior) / prior.abs() * 100.0)
    }
}
