//! Unified error types for pricewatch.
//!
//! Every variant renders with a stable code prefix so log lines and the
//! end-of-run failure summary can be grepped by kind.

use crate::Category;

/// Unified error types for the price monitor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A line of the URL list is not a usable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The URL path does not map to a known category.
    #[error("UNKNOWN_CATEGORY: {0}")]
    UnknownCategory(String),

    /// The URL list could not be read.
    #[error("INPUT_LIST: {0}")]
    InputList(String),

    /// Network failure before a response arrived.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Non-2xx HTTP response.
    #[error("HTTP_ERROR: status {status} for {url}")]
    Http { status: u16, url: String },

    /// No price strategy matched the page.
    #[error("EXTRACT_FAILED: [{category}] {url}: {reason}")]
    Extraction { category: Category, url: String, reason: String },

    /// A single persisted history entry could not be migrated.
    #[error("MIGRATION_FAILED: {0}")]
    Migration(String),

    /// The history file exists but is not a JSON object.
    #[error("HISTORY_CORRUPT: {path}: {reason}")]
    HistoryCorrupt { path: String, reason: String },

    /// Reading or writing the history file failed.
    #[error("PERSISTENCE_ERROR: {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Delivering the change report failed.
    #[error("NOTIFY_FAILED: {0}")]
    NotifyFailed(String),
}

impl Error {
    /// Stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::UnknownCategory(_) => "UNKNOWN_CATEGORY",
            Error::InputList(_) => "INPUT_LIST",
            Error::FetchFailed(_) => "FETCH_FAILED",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::Http { .. } => "HTTP_ERROR",
            Error::Extraction { .. } => "EXTRACT_FAILED",
            Error::Migration(_) => "MIGRATION_FAILED",
            Error::HistoryCorrupt { .. } => "HISTORY_CORRUPT",
            Error::Persistence { .. } => "PERSISTENCE_ERROR",
            Error::NotifyFailed(_) => "NOTIFY_FAILED",
        }
    }

    /// Whether this error must end the run instead of skipping one listing.
    ///
    /// Only history integrity failures are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::HistoryCorrupt { .. } | Error::Persistence { .. })
    }

    pub(crate) fn persistence(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Persistence { path: path.display().to_string(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Extraction {
            category: Category::Recommerce,
            url: "https://www.finn.no/recommerce/forsale/item/1".into(),
            reason: "could not extract price".into(),
        };
        let shown = err.to_string();
        assert!(shown.starts_with("EXTRACT_FAILED"));
        assert!(shown.contains("[recommerce]"));
        assert!(shown.contains("could not extract price"));
    }

    #[test]
    fn test_error_code_matches_display_prefix() {
        let errors = [
            Error::InvalidUrl("x".into()),
            Error::FetchTimeout("x".into()),
            Error::Http { status: 404, url: "x".into() },
            Error::Migration("x".into()),
            Error::NotifyFailed("x".into()),
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()));
        }
    }

    #[test]
    fn test_only_history_errors_are_fatal() {
        let io = std::io::Error::other("disk full");
        assert!(Error::persistence(std::path::Path::new("h.json"), io).is_fatal());
        assert!(Error::HistoryCorrupt { path: "h.json".into(), reason: "x".into() }.is_fatal());
        assert!(!Error::FetchFailed("x".into()).is_fatal());
        assert!(!Error::Migration("x".into()).is_fatal());
    }
}
