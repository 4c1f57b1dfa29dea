//! URL canonicalization and listing URL classification.

use pricewatch_core::{Category, Error};

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a URL string for fetching.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none() {
        return Err(UrlError::InvalidUrl(format!("missing host: {trimmed}")));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// A listing URL from the input list, classified by category.
///
/// `key` is the trimmed line as written; it identifies the listing in the
/// history file. `url` is the canonical form used for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingUrl {
    pub key: String,
    pub url: url::Url,
    pub category: Category,
}

impl ListingUrl {
    /// Parse and classify one line of the URL list.
    ///
    /// # Errors
    ///
    /// `Error::InvalidUrl` for unparseable input, `Error::UnknownCategory`
    /// when the path maps to no category.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let key = input.trim();
        let url = canonicalize(key)?;
        let category = Category::detect(url.path()).map_err(|_| Error::UnknownCategory(key.to_string()))?;
        Ok(Self { key: key.to_string(), url, category })
    }
}
