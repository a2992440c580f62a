//! Daily price quotes and window normalization

use crate::error::{Result, TrackerError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw provider bar for one trading day, before validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub volume: u64,
}

/// Validated open/close/volume for one company on one trading day
///
/// The percentage change is always recomputed from open and close; it is
/// never stored, so it can never drift from the prices that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub open: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyQuote {
    /// Validate and construct a quote
    ///
    /// Rejects a non-positive or non-finite open price so `pct_change`
    /// can never divide by zero or produce NaN.
    pub fn new(symbol: &str, open: f64, close: f64, volume: u64) -> Result<Self> {
        if !open.is_finite() || open <= 0.0 {
            return Err(TrackerError::Data {
                symbol: symbol.to_string(),
                reason: format!("open price must be positive, got {open}"),
            });
        }
        if !close.is_finite() || close < 0.0 {
            return Err(TrackerError::Data {
                symbol: symbol.to_string(),
                reason: format!("close price must be a finite non-negative number, got {close}"),
            });
        }
        Ok(Self {
            open,
            close,
            volume,
        })
    }

    /// Percentage change from open to close
    pub fn pct_change(&self) -> f64 {
        (self.close - self.open) / self.open * 100.0
    }

    /// Direction of the move, derived from the percentage change
    pub fn direction(&self) -> Direction {
        Direction::from_pct(self.pct_change())
    }
}

/// Direction of a daily move
///
/// All direction words in queries and auto-generated summaries come from
/// here, so a summary's wording always agrees with the sign of the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_pct(pct: f64) -> Self {
        if pct > 0.0 { Self::Up } else { Self::Down }
    }

    /// "up" / "down" - used in search queries
    pub fn adjective(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// "rises" / "drops" - used in headline-style queries
    pub fn verb_present(&self) -> &'static str {
        match self {
            Self::Up => "rises",
            Self::Down => "drops",
        }
    }

    /// "rose" / "fell" - used in past-tense narratives
    pub fn verb_past(&self) -> &'static str {
        match self {
            Self::Up => "rose",
            Self::Down => "fell",
        }
    }
}

/// Select the exact target date's bar out of a provider window
///
/// Providers return a short window of days around the target; weekends and
/// holidays legitimately have no row, so a missing date is `Ok(None)`
/// (skip), not an error. A matching row with a bad open price is a data
/// error for this symbol only.
pub fn normalize(symbol: &str, date: NaiveDate, window: &[RawBar]) -> Result<Option<DailyQuote>> {
    let Some(bar) = window.iter().find(|b| b.date == date) else {
        return Ok(None);
    };
    DailyQuote::new(symbol, bar.open, bar.close, bar.volume).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, open: f64, close: f64) -> RawBar {
        RawBar {
            date: date.parse().unwrap(),
            open,
            close,
            volume: 1_000_000,
        }
    }

    #[test]
    fn test_pct_change() {
        let quote = DailyQuote::new("DKNG", 100.0, 102.0, 500).unwrap();
        assert!((quote.pct_change() - 2.0).abs() < 1e-9);

        let quote = DailyQuote::new("DKNG", 100.0, 96.5, 500).unwrap();
        assert!((quote.pct_change() + 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_open_is_data_error() {
        let err = DailyQuote::new("CZR", 0.0, 50.0, 100).unwrap_err();
        assert!(matches!(err, TrackerError::Data { symbol, .. } if symbol == "CZR"));
    }

    #[test]
    fn test_non_finite_open_is_data_error() {
        assert!(DailyQuote::new("CZR", f64::NAN, 50.0, 100).is_err());
        assert!(DailyQuote::new("CZR", f64::INFINITY, 50.0, 100).is_err());
    }

    #[test]
    fn test_direction_words() {
        assert_eq!(Direction::from_pct(3.1).verb_past(), "rose");
        assert_eq!(Direction::from_pct(-2.2).verb_past(), "fell");
        assert_eq!(Direction::from_pct(1.0).adjective(), "up");
        assert_eq!(Direction::from_pct(-1.0).adjective(), "down");
        // Zero reads as a non-gain
        assert_eq!(Direction::from_pct(0.0), Direction::Down);
    }

    #[test]
    fn test_normalize_picks_exact_date() {
        let window = vec![
            bar("2025-12-03", 40.0, 41.0),
            bar("2025-12-04", 41.0, 42.0),
            bar("2025-12-05", 42.0, 40.0),
        ];
        let quote = normalize("DKNG", "2025-12-04".parse().unwrap(), &window)
            .unwrap()
            .unwrap();
        assert_eq!(quote.open, 41.0);
        assert_eq!(quote.close, 42.0);
    }

    #[test]
    fn test_normalize_absent_for_missing_date() {
        let window = vec![bar("2025-12-03", 40.0, 41.0)];
        // Saturday: no row in the window, absent rather than an error
        let result = normalize("DKNG", "2025-12-06".parse().unwrap(), &window).unwrap();
        assert!(result.is_none());

        let result = normalize("DKNG", "2025-12-06".parse().unwrap(), &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_normalize_rejects_zero_open_row() {
        let window = vec![bar("2025-12-04", 0.0, 41.0)];
        let err = normalize("RSI", "2025-12-04".parse().unwrap(), &window).unwrap_err();
        assert!(matches!(err, TrackerError::Data { .. }));
    }
}
