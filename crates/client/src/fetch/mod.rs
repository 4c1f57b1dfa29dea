//! Blocking HTTP fetch for listing pages.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Requests
//! - One request at a time, browser-like headers.
//! - Max redirects: 5
//! - Any status is returned to the caller; see [`FetchResponse::error_for_status`].

pub mod url;

use reqwest::blocking::Client;
use reqwest::{Url, header};
use std::time::{Duration, Instant};

pub use reqwest::StatusCode;
pub use url::{ListingUrl, UrlError, canonicalize};

use pricewatch_core::{AppConfig, Error};

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string sent with every request
    pub user_agent: String,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: 5 }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Decoded response body
    pub body: String,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Turn a non-2xx status into `Error::Http`.
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Http { status: self.status.as_u16(), url: self.url.to_string() })
        }
    }
}

/// Source of raw listing HTML.
pub trait Fetcher {
    /// Fetch a page. Non-2xx responses are returned, not turned into errors.
    fn fetch(&self, url: &Url) -> Result<FetchResponse, Error>;
}

/// Fetcher backed by a blocking reqwest client.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_static(ACCEPT_LANGUAGE));

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self.http.get(url.clone()).send().map_err(|e| classify(url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let body = response.text().map_err(|e| classify(url, &e))?;
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(%url, %final_url, status = status.as_u16(), fetch_ms, bytes = body.len(), "fetched listing");

        Ok(FetchResponse { url: url.clone(), final_url, status, body, fetch_ms })
    }
}

fn classify(url: &Url, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::FetchFailed(format!("{url}: {err}"))
    }
}
