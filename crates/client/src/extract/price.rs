//! Category-specific price extraction.
//!
//! Each category has an ordered chain of strategies. Strategies are tried
//! strictly in order and the first one that yields a parseable price wins;
//! later strategies are never evaluated.

use std::fmt;
use std::sync::LazyLock;

use pricewatch_core::Category;
use pricewatch_core::price::parse_price_value;
use pricewatch_core::text::normalize;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::dom::{element_text, own_text, parent_element, selector, text_nodes};

/// Localized label next to the total price.
const TOTAL_PRICE_LABEL: &str = "Totalpris";

/// How many levels (the label, then its parent) are searched for the amount.
const LABEL_SEARCH_DEPTH: usize = 2;

/// Characters of raw HTML inspected after a "Til salgs" marker.
const RAW_WINDOW_CHARS: usize = 400;

/// A price-shaped token: space-grouped thousands or a plain digit run, then `kr`.
static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}(?: [0-9]{3})+|[0-9]+)\s*kr\b").expect("invalid price regex")
});

static FOR_SALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)til(?:\s|&nbsp;|&#160;|&#xa0;)+salgs").expect("invalid for-sale regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

static PRICE_TEXT_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""priceText"\s*:\s*"([^"]+)""#).expect("invalid priceText regex"));

static ATTRIBUTE_MARKERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["[data-testid=\"pricing-total-price\"]", "[data-testid=\"price\"]"].into_iter().map(selector).collect()
});

static LABEL_CANDIDATES: LazyLock<Selector> = LazyLock::new(|| selector("dt, p, span, div, strong"));
static STYLED_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span.t2"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static HEADING_PRICE: LazyLock<Selector> = LazyLock::new(|| selector("p.h2"));

/// A named price extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStrategy {
    /// Element carrying the site's structured price marker attribute.
    AttributeLookup,
    /// "Totalpris" label with the amount in a sibling or parent element.
    LabelSibling,
    /// Any `span.t2` mentioning kroner.
    StyledSpan,
    /// "Til salgs" followed by an amount, searched in the unparsed HTML.
    RawRegex,
    /// `"priceText": "..."` in embedded page state.
    EmbeddedJson,
    /// Amount under an `h2` heading containing "Til salgs".
    DomFallback,
}

impl PriceStrategy {
    pub fn name(self) -> &'static str {
        match self {
            PriceStrategy::AttributeLookup => "attribute-lookup",
            PriceStrategy::LabelSibling => "label-sibling",
            PriceStrategy::StyledSpan => "styled-span",
            PriceStrategy::RawRegex => "raw-regex",
            PriceStrategy::EmbeddedJson => "embedded-json",
            PriceStrategy::DomFallback => "dom-fallback",
        }
    }

    /// Strategy chain for a category, highest priority first.
    pub fn chain(category: Category) -> &'static [PriceStrategy] {
        use PriceStrategy::*;
        match category {
            Category::Realestate => &[AttributeLookup, LabelSibling],
            Category::Mobility => &[AttributeLookup, LabelSibling, StyledSpan],
            Category::Recommerce => &[AttributeLookup, RawRegex, EmbeddedJson, DomFallback],
        }
    }

    fn apply(self, document: &Html, raw_html: &str) -> Option<u64> {
        match self {
            PriceStrategy::AttributeLookup => attribute_lookup(document),
            PriceStrategy::LabelSibling => label_sibling(document),
            PriceStrategy::StyledSpan => styled_span(document),
            PriceStrategy::RawRegex => raw_regex(raw_html),
            PriceStrategy::EmbeddedJson => embedded_json(raw_html),
            PriceStrategy::DomFallback => dom_fallback(document),
        }
    }
}

impl fmt::Display for PriceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A price together with the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceMatch {
    pub price: u64,
    pub strategy: PriceStrategy,
}

/// Extract the listing price in whole kroner, or `None` if no strategy matched.
pub fn extract_price(document: &Html, raw_html: &str, category: Category) -> Option<u64> {
    extract_price_match(document, raw_html, category).map(|m| m.price)
}

/// Like [`extract_price`], also reporting which strategy matched.
pub fn extract_price_match(document: &Html, raw_html: &str, category: Category) -> Option<PriceMatch> {
    PriceStrategy::chain(category).iter().find_map(|&strategy| {
        let price = strategy.apply(document, raw_html)?;
        tracing::debug!(%category, %strategy, price, "price strategy matched");
        Some(PriceMatch { price, strategy })
    })
}

/// First price-shaped token in `text`, parsed.
pub fn find_price(text: &str) -> Option<u64> {
    let normalized = normalize(text);
    PRICE_TOKEN.find(&normalized).and_then(|m| parse_price_value(m.as_str()))
}

/// First price token in any single text node of `el`.
fn price_in(el: ElementRef<'_>) -> Option<u64> {
    text_nodes(el).iter().find_map(|text| find_price(text))
}

fn attribute_lookup(document: &Html) -> Option<u64> {
    ATTRIBUTE_MARKERS.iter().find_map(|marker| document.select(marker).find_map(price_in))
}

fn label_sibling(document: &Html) -> Option<u64> {
    document.select(&LABEL_CANDIDATES).filter(|el| is_total_price_label(*el)).find_map(|label| {
        std::iter::successors(Some(label), |el| parent_element(*el)).take(LABEL_SEARCH_DEPTH).find_map(amount_near)
    })
}

/// Amount in a following sibling, else in a styled span or the text of the parent.
fn amount_near(el: ElementRef<'_>) -> Option<u64> {
    el.next_siblings().filter_map(ElementRef::wrap).find_map(price_in).or_else(|| {
        let parent = parent_element(el)?;
        parent.select(&STYLED_SPAN).find_map(price_in).or_else(|| price_in(parent))
    })
}

fn is_total_price_label(el: ElementRef<'_>) -> bool {
    own_text(el).trim_end_matches(':').trim().eq_ignore_ascii_case(TOTAL_PRICE_LABEL)
}

fn styled_span(document: &Html) -> Option<u64> {
    document.select(&STYLED_SPAN).filter(|span| element_text(*span).contains("kr")).find_map(price_in)
}

fn raw_regex(raw_html: &str) -> Option<u64> {
    FOR_SALE.find_iter(raw_html).find_map(|marker| {
        let rest = &raw_html[marker.end()..];
        let window = match rest.char_indices().nth(RAW_WINDOW_CHARS) {
            Some((end, _)) => &rest[..end],
            None => rest,
        };
        TAG.split(window).find_map(|segment| find_price(&decode_spaces(segment)))
    })
}

fn embedded_json(raw_html: &str) -> Option<u64> {
    PRICE_TEXT_JSON
        .captures_iter(raw_html)
        .find_map(|caps| find_price(&decode_spaces(&caps[1])))
}

fn dom_fallback(document: &Html) -> Option<u64> {
    document
        .select(&HEADING)
        .filter(|h| element_text(*h).to_lowercase().contains("til salgs"))
        .filter_map(parent_element)
        .find_map(|container| container.select(&HEADING_PRICE).find_map(price_in).or_else(|| price_in(container)))
}

/// Decode the space entities and JSON escapes that show up around prices.
fn decode_spaces(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xa0;", " ")
        .replace("\\u00a0", " ")
        .replace("\\u202f", " ")
}
