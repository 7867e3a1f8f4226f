//! Error types for title lookups.

use crate::browser::DriverError;
use std::time::Duration;
use thiserror::Error;

/// Why a single field of a result row could not be read.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("element text was empty")]
    Empty,

    #[error("attribute `{0}` is missing")]
    MissingAttribute(&'static str),
}

/// Error type for session and lookup operations.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The browser could not be started or the home page did not load.
    #[error("browser session could not be started: {0}")]
    Bootstrap(#[source] DriverError),

    /// No result row appeared before the wait ran out.
    #[error("no results for '{query}' within {waited:?}")]
    NoResults { query: String, waited: Duration },

    /// A result row did not have the expected structure.
    #[error("result row {row}: could not extract {field}: {source}")]
    Extraction {
        row: usize,
        field: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_results_display() {
        let err = LookupError::NoResults {
            query: "Nonexistent Film".to_string(),
            waited: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "no results for 'Nonexistent Film' within 10s");
    }

    #[test]
    fn test_extraction_display_names_row_and_field() {
        let err = LookupError::Extraction { row: 3, field: "year", source: FieldError::Empty };
        assert_eq!(err.to_string(), "result row 3: could not extract year: element text was empty");
    }

    #[test]
    fn test_extraction_wraps_driver_timeout() {
        let err = LookupError::Extraction {
            row: 0,
            field: "title",
            source: FieldError::from(DriverError::Timeout {
                target: ".header-title".to_string(),
                waited: Duration::from_secs(10),
            }),
        };
        let display = err.to_string();
        assert!(display.contains("result row 0"));
        assert!(display.contains(".header-title"));
    }

    #[test]
    fn test_bootstrap_display() {
        let err = LookupError::Bootstrap(DriverError::Navigation {
            url: "https://www.justwatch.com".to_string(),
            reason: "connection refused".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "browser session could not be started: navigation to https://www.justwatch.com failed: connection refused"
        );
    }

    #[test]
    fn test_missing_attribute_display() {
        assert_eq!(FieldError::MissingAttribute("href").to_string(), "attribute `href` is missing");
    }
}
