//! Change reporting for notifications.
//!
//! Turns per-listing change results into an ordered, display-ready report and
//! renders it as plain text or HTML email bodies.

use serde::Serialize;

use crate::history::{ChangeResult, Direction};
use crate::price::{format_delta, format_price, format_price_opt};
use crate::Category;

const TITLE_MAX_CHARS: usize = 60;
const FOOTER: &str = concat!("pricewatch v", env!("CARGO_PKG_VERSION"));

/// Input to [`summarize`]: one listing's change result and context.
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    pub key: String,
    pub category: Category,
    pub title: String,
    pub change: ChangeResult,
}

/// One display row of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub url: String,
    pub category: Category,
    pub title: String,
    pub old_price: String,
    pub new_price: String,
    pub delta: String,
    pub delta_value: i64,
    pub direction: Direction,
}

/// Structured change report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum Report {
    /// Nothing changed this run.
    NoChanges,
    /// Changed listings, grouped by category, largest moves first.
    Changes(Vec<ReportRow>),
}

/// Build a report from the listings checked this run.
///
/// Unchanged and first-seen entries are dropped. Rows are ordered by category
/// and then by absolute price delta, descending.
pub fn summarize(changes: &[ChangeEntry]) -> Report {
    let mut rows: Vec<ReportRow> = changes.iter().filter(|entry| entry.change.changed).map(row).collect();

    if rows.is_empty() {
        return Report::NoChanges;
    }

    rows.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| b.delta_value.unsigned_abs().cmp(&a.delta_value.unsigned_abs()))
    });

    Report::Changes(rows)
}

fn row(entry: &ChangeEntry) -> ReportRow {
    let delta_value = entry.change.delta();
    ReportRow {
        url: entry.key.clone(),
        category: entry.category,
        title: display_title(&entry.title),
        old_price: format_price_opt(entry.change.previous_price),
        new_price: format_price(entry.change.new_price),
        delta: format_delta(delta_value),
        delta_value,
        direction: entry.change.direction,
    }
}

fn display_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return "Unknown".to_string();
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

impl Report {
    pub fn rows(&self) -> &[ReportRow] {
        match self {
            Report::NoChanges => &[],
            Report::Changes(rows) => rows,
        }
    }

    pub fn has_changes(&self) -> bool {
        matches!(self, Report::Changes(_))
    }

    /// Email subject line.
    pub fn subject(&self) -> String {
        match self.rows().len() {
            0 => "Price Monitor: no changes".to_string(),
            1 => "Price Monitor: 1 listing changed".to_string(),
            n => format!("Price Monitor: {n} listings changed"),
        }
    }

    /// Plain-text body.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        match self {
            Report::NoChanges => out.push_str("No price changes detected.\n"),
            Report::Changes(rows) => {
                out.push_str("Price changes detected:\n\n");
                let mut current = None;
                for (i, row) in rows.iter().enumerate() {
                    if current != Some(row.category) {
                        out.push_str(&format!("[{}]\n", row.category));
                        current = Some(row.category);
                    }
                    out.push_str(&format!(
                        "{}. {}\n   {} -> {} ({})\n   {}\n\n",
                        i + 1,
                        row.title,
                        row.old_price,
                        row.new_price,
                        row.delta,
                        row.url
                    ));
                }
            }
        }

        out.push_str("---\n");
        out.push_str(FOOTER);
        out
    }

    /// HTML body with one table row per change.
    pub fn render_html(&self) -> String {
        let rows = self.rows();
        let mut table = String::new();

        for row in rows {
            let color = match row.direction {
                Direction::Up => "#c62828",
                Direction::Down => "#2e7d32",
                Direction::None => "#666",
            };
            table.push_str(&format!(
                "<tr><td>{category}</td><td>{title}</td><td>{old}</td><td><b>{new}</b></td>\
                 <td style='color:{color}'>{delta}</td><td><a href='{url}'>View</a></td></tr>",
                category = row.category,
                title = escape_html(&row.title),
                old = row.old_price,
                new = row.new_price,
                delta = row.delta,
                url = escape_html(&row.url),
            ));
        }

        let heading = if rows.is_empty() {
            "No price changes".to_string()
        } else {
            format!("{} Price Change(s)", rows.len())
        };

        format!(
            "<html><body style='font-family:sans-serif;max-width:700px'>\n<h2>{heading}</h2>\n\
             <table border='0' cellpadding='8' style='border-collapse:collapse;width:100%'>\n\
             <tr style='background:#1976d2;color:white'><th>Category</th><th>Listing</th><th>Old</th><th>New</th>\
             <th>Change</th><th>Link</th></tr>\n{table}</table>\n\
             <p style='color:#666;font-size:12px'>{FOOTER}</p></body></html>"
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, category: Category, title: &str, previous: Option<u64>, new: u64) -> ChangeEntry {
        ChangeEntry { key: key.into(), category, title: title.into(), change: ChangeResult::compare(previous, new) }
    }

    #[test]
    fn test_empty_input_is_explicit_no_changes() {
        let report = summarize(&[]);
        assert_eq!(report, Report::NoChanges);
        assert!(!report.has_changes());
        assert!(report.render_text().contains("No price changes"));
        assert_eq!(report.subject(), "Price Monitor: no changes");
    }

    #[test]
    fn test_unchanged_and_first_seen_are_dropped() {
        let report = summarize(&[
            entry("a", Category::Mobility, "Car", Some(100), 100),
            entry("b", Category::Mobility, "Bike", None, 100),
        ]);
        assert_eq!(report, Report::NoChanges);
    }

    #[test]
    fn test_orders_by_category_then_largest_move() {
        let report = summarize(&[
            entry("small", Category::Recommerce, "PS5", Some(7_500), 8_000),
            entry("car", Category::Mobility, "BMW", Some(150_000), 145_000),
            entry("big", Category::Recommerce, "Sofa", Some(20_000), 10_000),
            entry("home", Category::Realestate, "Leilighet", Some(5_000_000), 4_900_000),
        ]);

        let urls: Vec<_> = report.rows().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["home", "car", "big", "small"]);
    }

    #[test]
    fn test_row_formatting() {
        let report = summarize(&[entry("u", Category::Realestate, "Hus", Some(5_434_495), 5_434_496)]);
        let row = &report.rows()[0];

        assert_eq!(row.old_price, "5 434 495 kr");
        assert_eq!(row.new_price, "5 434 496 kr");
        assert_eq!(row.delta, "+1 kr");
        assert_eq!(row.delta_value, 1);
        assert_eq!(row.direction, Direction::Up);
    }

    #[test]
    fn test_title_fallback_and_truncation() {
        let long = "x".repeat(80);
        let report = summarize(&[
            entry("a", Category::Mobility, "", Some(1), 2),
            entry("b", Category::Mobility, &long, Some(1), 3),
        ]);

        let titles: Vec<_> = report.rows().iter().map(|r| r.title.clone()).collect();
        assert!(titles.contains(&"Unknown".to_string()));
        assert!(titles.contains(&format!("{}...", "x".repeat(60))));
    }

    #[test]
    fn test_subject_pluralization() {
        let one = summarize(&[entry("a", Category::Mobility, "A", Some(1), 2)]);
        let two = summarize(&[entry("a", Category::Mobility, "A", Some(1), 2), entry("b", Category::Mobility, "B", Some(2), 1)]);
        assert_eq!(one.subject(), "Price Monitor: 1 listing changed");
        assert_eq!(two.subject(), "Price Monitor: 2 listings changed");
    }

    #[test]
    fn test_render_text_lists_changes() {
        let report = summarize(&[entry("https://www.finn.no/recommerce/forsale/item/1", Category::Recommerce, "PS5", Some(7_500), 8_000)]);
        let text = report.render_text();

        assert!(text.contains("[recommerce]"));
        assert!(text.contains("1. PS5"));
        assert!(text.contains("7 500 kr -> 8 000 kr (+500 kr)"));
        assert!(text.contains("https://www.finn.no/recommerce/forsale/item/1"));
    }

    #[test]
    fn test_render_text_layout() {
        let report = summarize(&[
            entry("https://www.finn.no/mobility/item/2", Category::Mobility, "BMW", Some(150_000), 145_000),
            entry("https://www.finn.no/realestate/homes/ad.html", Category::Realestate, "Hus", Some(5_000_000), 5_100_000),
        ]);

        let expected = format!(
            "Price changes detected:\n\n\
             [realestate]\n1. Hus\n   5 000 000 kr -> 5 100 000 kr (+100 000 kr)\n   https://www.finn.no/realestate/homes/ad.html\n\n\
             [mobility]\n2. BMW\n   150 000 kr -> 145 000 kr (-5 000 kr)\n   https://www.finn.no/mobility/item/2\n\n\
             ---\n{FOOTER}"
        );
        assert_eq!(report.render_text(), expected);
    }

    #[test]
    fn test_render_html_escapes_and_colors() {
        let report = summarize(&[
            entry("u1", Category::Recommerce, "<b>PS5</b> & spill", Some(7_500), 8_000),
            entry("u2", Category::Recommerce, "Sofa", Some(9_000), 8_000),
        ]);
        let html = report.render_html();

        assert!(html.contains("2 Price Change(s)"));
        assert!(html.contains("&lt;b&gt;PS5&lt;/b&gt; &amp; spill"));
        assert!(html.contains("color:#c62828'>+500 kr"));
        assert!(html.contains("color:#2e7d32'>-1 000 kr"));
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let json = serde_json::to_value(Report::NoChanges).unwrap();
        assert_eq!(json["status"], "no_changes");
    }
}
