//! Error types for tracker operations

use chrono::NaiveDate;
use thiserror::Error;

/// Tracker specific errors
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No data available for the requested symbol/date (holiday, weekend, delisted)
    #[error("no data for {symbol}: {reason}")]
    NoData { symbol: String, reason: String },

    /// Malformed quote data (zero or missing open price, non-finite values)
    #[error("bad quote for {symbol}: {reason}")]
    Data { symbol: String, reason: String },

    /// An external collaborator (search, generation, notification) failed
    #[error("{provider} unavailable: {reason}")]
    Collaborator { provider: String, reason: String },

    /// Reading or writing a persisted store failed
    #[error("persistence error for {path}: {reason}")]
    Persistence { path: String, reason: String },

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested date cannot be analyzed (market not yet closed)
    #[error("cannot analyze {date}: {reason}")]
    InvalidDate { date: NaiveDate, reason: String },

    /// A patch target (date, ticker, or quarter) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Report template failed to render
    #[error("render error: {0}")]
    Render(String),
}

impl TrackerError {
    /// Wrap a collaborator failure with its provider name
    pub fn collaborator(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Collaborator {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a persistence failure with the path it concerned
    pub fn persistence(path: impl ToString, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error should abort the whole batch (as opposed to
    /// degrading a single ticker or narrative)
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Config(_))
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackerError::Data {
            symbol: "DKNG".to_string(),
            reason: "zero open price".to_string(),
        };
        assert_eq!(err.to_string(), "bad quote for DKNG: zero open price");

        let err = TrackerError::collaborator("slack", "HTTP 500");
        assert_eq!(err.to_string(), "slack unavailable: HTTP 500");
    }

    #[test]
    fn test_fatality() {
        assert!(TrackerError::Config("missing webhook".into()).is_fatal());
        assert!(TrackerError::persistence("history.json", "disk full").is_fatal());
        assert!(
            !TrackerError::NoData {
                symbol: "MGM".into(),
                reason: "holiday".into()
            }
            .is_fatal()
        );
        assert!(!TrackerError::collaborator("search", "timeout").is_fatal());
    }
}
