//! Client code for pricewatch.
//!
//! This crate provides the blocking fetch pipeline, listing extraction,
//! debug dumps and report delivery used by the CLI.

pub mod diagnostics;
pub mod extract;
pub mod fetch;
pub mod notify;

pub use diagnostics::DebugDumps;
pub use extract::{Extractor, FinnExtractor, ParsedListing, PriceStrategy, extract_price, extract_title, parse_listing};
pub use fetch::{FetchConfig, FetchResponse, Fetcher, HttpFetcher, ListingUrl};
pub use notify::{LogNotifier, Notifier, OutboxNotifier, SmtpNotifier, build_message};
