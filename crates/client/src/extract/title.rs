//! Listing title extraction.

use std::sync::LazyLock;

use pricewatch_core::Category;
use regex::Regex;
use scraper::{Html, Selector};

use super::dom::{element_text, selector};

/// Title selectors, highest priority first.
const TITLE_SELECTORS: [&str; 3] = ["[data-testid=\"object-title\"]", "h1", "h1.t1"];

static SELECTORS: LazyLock<Vec<(&'static str, Selector)>> =
    LazyLock::new(|| TITLE_SELECTORS.into_iter().map(|css| (css, selector(css))).collect());

/// Status words the site prepends to titles: "Til salgs - Gaming PC".
static STATUS_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:til\s+salgs|utleie|solgt)(?:\s*[-–—:]\s*|\s+|$)").expect("invalid prefix regex")
});

/// Extract the listing title, or an empty string when none is found.
///
/// Each selector's first match is read with the two-step text retrieval and
/// stripped of status prefixes; the first non-empty result wins.
pub fn extract_title(document: &Html, category: Category) -> String {
    for (css, sel) in SELECTORS.iter() {
        let Some(el) = document.select(sel).next() else {
            continue;
        };

        let title = strip_status_prefix(&element_text(el));
        if !title.is_empty() {
            tracing::debug!(%category, selector = css, %title, "title found");
            return title;
        }
    }

    tracing::debug!(%category, "no title found");
    String::new()
}

/// Remove a leading "Til salgs", "Utleie" or "Solgt" and an optional dash or colon.
pub fn strip_status_prefix(title: &str) -> String {
    STATUS_PREFIX.replace(title.trim(), "").trim().to_string()
}
