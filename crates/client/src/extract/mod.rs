//! Listing extraction: price and title from marketplace HTML.
//!
//! ### Price
//! - Per-category strategy chains (see [`PriceStrategy::chain`]).
//! - First strategy that yields a parseable amount wins.
//!
//! ### Title
//! - Selector chain with two-step text retrieval and status-prefix stripping.
//! - A missing title is not an error.
//!
//! ### Stable Abstraction
//! - The `Extractor` trait decouples the check loop from the extraction rules.

pub mod dom;
pub mod price;
pub mod title;

pub use price::{PriceMatch, PriceStrategy, extract_price, extract_price_match, find_price};
pub use title::{extract_title, strip_status_prefix};

use chrono::{DateTime, Utc};
use pricewatch_core::{Category, Error, Observation};
use scraper::Html;

/// A successfully parsed listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedListing {
    pub url: String,
    pub category: Category,
    /// Whole kroner.
    pub price: u64,
    /// Possibly empty.
    pub title: String,
    /// Strategy that produced the price.
    pub strategy: PriceStrategy,
    pub parsed_at: DateTime<Utc>,
}

impl From<ParsedListing> for Observation {
    fn from(listing: ParsedListing) -> Self {
        Observation::new(listing.price, listing.title, listing.parsed_at)
    }
}

/// Stable extractor trait for listing pages.
pub trait Extractor: Send + Sync {
    /// Extract price and title from a listing page.
    fn extract(&self, html: &str, category: Category, url: &str) -> Result<ParsedListing, Error>;
}

/// Extractor for finn.no listing markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinnExtractor;

impl Extractor for FinnExtractor {
    fn extract(&self, html: &str, category: Category, url: &str) -> Result<ParsedListing, Error> {
        parse_listing(html, category, url)
    }
}

/// Parse a listing page once and extract its price and title.
///
/// # Errors
///
/// Returns `Error::Extraction` tagged with category and url when no price
/// strategy matches. An empty title alone is not an error.
pub fn parse_listing(html: &str, category: Category, url: &str) -> Result<ParsedListing, Error> {
    let document = Html::parse_document(html);
    let title = extract_title(&document, category);

    let Some(found) = extract_price_match(&document, html, category) else {
        return Err(Error::Extraction {
            category,
            url: url.to_string(),
            reason: if title.is_empty() {
                "could not extract price or title".into()
            } else {
                format!("could not extract price (title: {title})")
            },
        });
    };

    if title.is_empty() {
        tracing::warn!(%category, url, "listing has a price but no title");
    }

    Ok(ParsedListing {
        url: url.to_string(),
        category,
        price: found.price,
        title,
        strategy: found.strategy,
        parsed_at: Utc::now(),
    })
}
