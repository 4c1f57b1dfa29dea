//! Text retrieval from parsed elements.
//!
//! Retrieval is two-step. The primary path reads the visible descendant text.
//! When that comes back empty, the alternate path reads every descendant text
//! node (hidden ones included) and then the value-carrying attributes.

use pricewatch_core::text::squash;
use scraper::{ElementRef, Selector};

/// Subtrees whose text never counts as visible.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Attributes that may carry an element's text when it has no text nodes.
const VALUE_ATTRIBUTES: &[&str] = &["content", "title", "aria-label", "value"];

/// Parse a selector that is known to be valid at compile time.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Element text with the alternate-path fallback, whitespace squashed.
pub fn element_text(el: ElementRef<'_>) -> String {
    let primary = visible_text(el);
    if !primary.is_empty() {
        return primary;
    }
    alternate_text(el)
}

/// Visible descendant text.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    push_visible(el, &mut parts);
    squash(&parts.join(" "))
}

/// All descendant text nodes, then value attributes.
pub fn alternate_text(el: ElementRef<'_>) -> String {
    let text = squash(&el.text().collect::<Vec<_>>().join(" "));
    if !text.is_empty() {
        return text;
    }

    VALUE_ATTRIBUTES
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(squash)
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Text of `el` one node at a time, with the same fallback order as
/// [`element_text`]. Text from neighbouring elements is never joined.
pub fn text_nodes(el: ElementRef<'_>) -> Vec<String> {
    let mut parts = Vec::new();
    push_visible(el, &mut parts);

    let visible = non_empty(parts.into_iter());
    if !visible.is_empty() {
        return visible;
    }

    let hidden = non_empty(el.text());
    if !hidden.is_empty() {
        return hidden;
    }

    non_empty(VALUE_ATTRIBUTES.iter().filter_map(|name| el.value().attr(name)))
}

fn non_empty<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    texts.map(squash).filter(|text| !text.is_empty()).collect()
}

/// Text nodes that are direct children of `el`.
pub fn own_text(el: ElementRef<'_>) -> String {
    let parts: Vec<&str> = el.children().filter_map(|child| child.value().as_text().map(|t| &**t)).collect();
    squash(&parts.join(" "))
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

fn push_visible<'a>(el: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    if is_hidden(el) {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            parts.push(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            push_visible(child_el, parts);
        }
    }
}

fn is_hidden(el: ElementRef<'_>) -> bool {
    let value = el.value();
    INVISIBLE_TAGS.contains(&value.name())
        || value.attr("hidden").is_some()
        || value.attr("aria-hidden").is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
