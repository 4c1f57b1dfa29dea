//! Price parsing and display formatting.
//!
//! Prices are whole kroner stored as `u64`. Display strings group thousands
//! with a space and carry the `kr` suffix (`5 434 496 kr`); parsing accepts
//! that form back, including non-breaking space separators.

use crate::text::normalize;

/// Currency suffix used by the marketplace.
pub const CURRENCY_SUFFIX: &str = "kr";

/// Parse a display price such as `"5 434 496 kr"` into whole kroner.
///
/// Returns `None` for anything that is not purely digits once spaces and the
/// currency suffix are stripped, including the empty string.
pub fn parse_price_value(text: &str) -> Option<u64> {
    let normalized = normalize(text);
    let digits: String = normalized.replace(CURRENCY_SUFFIX, "").chars().filter(|c| !c.is_whitespace()).collect();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Format a price for display: `5434496` becomes `"5 434 496 kr"`.
pub fn format_price(price: u64) -> String {
    format!("{} {CURRENCY_SUFFIX}", group_thousands(&price.to_string()))
}

/// Format an optional price, `N/A` when absent.
pub fn format_price_opt(price: Option<u64>) -> String {
    price.map(format_price).unwrap_or_else(|| "N/A".to_string())
}

/// Format a signed price difference: `+1 000 kr`, `-500 kr`, `0 kr`.
pub fn format_delta(delta: i64) -> String {
    let sign = match delta.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    format!("{sign}{} {CURRENCY_SUFFIX}", group_thousands(&delta.unsigned_abs().to_string()))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normal_formats() {
        let cases = [
            ("5 500 000 kr", 5_500_000),
            ("150 000 kr", 150_000),
            ("7500 kr", 7_500),
            ("1 234 567 kr", 1_234_567),
            ("5000000 kr", 5_000_000),
            ("0 kr", 0),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_price_value(input), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_parse_nbsp() {
        assert_eq!(parse_price_value("5\u{00a0}434\u{00a0}496 kr"), Some(5_434_496));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        for input in ["", "kr", "not a price", "abc123", "1 500,- kr", "-500 kr", "12.5 kr"] {
            assert_eq!(parse_price_value(input), None, "{input}");
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(5_500_000), "5 500 000 kr");
        assert_eq!(format_price(150_000), "150 000 kr");
        assert_eq!(format_price(7_500), "7 500 kr");
        assert_eq!(format_price(999), "999 kr");
        assert_eq!(format_price(0), "0 kr");
    }

    #[test]
    fn test_format_price_opt_none() {
        assert_eq!(format_price_opt(None), "N/A");
        assert_eq!(format_price_opt(Some(1_500)), "1 500 kr");
    }

    #[test]
    fn test_display_round_trip() {
        let shown = format_price(5_434_496);
        assert_eq!(shown, "5 434 496 kr");
        assert_eq!(parse_price_value(&shown), Some(5_434_496));
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(1), "+1 kr");
        assert_eq!(format_delta(-100_000), "-100 000 kr");
        assert_eq!(format_delta(0), "0 kr");
    }
}
