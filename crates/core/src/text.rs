//! Text normalization applied before any pattern matching.

/// Space-like code points the marketplace emits in prices and titles.
const SPACE_VARIANTS: &[char] = &[
    '\u{00a0}', // no-break space
    '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}', '\u{2006}',
    '\u{2007}', // figure space
    '\u{2008}', '\u{2009}', '\u{200a}',
    '\u{202f}', // narrow no-break space
    '\u{205f}', '\u{3000}',
];

/// Replace every non-breaking and typographic space with an ASCII space.
///
/// Idempotent: the output never contains a character this function rewrites.
pub fn normalize(text: &str) -> String {
    text.chars().map(|c| if SPACE_VARIANTS.contains(&c) { ' ' } else { c }).collect()
}

/// Normalize, collapse runs of whitespace into one space and trim.
pub fn squash(text: &str) -> String {
    normalize(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nbsp() {
        let normalized = normalize("5\u{00a0}500\u{00a0}000 kr");
        assert!(!normalized.contains('\u{00a0}'));
        assert_eq!(normalized, "5 500 000 kr");
    }

    #[test]
    fn test_normalize_narrow_and_thin_spaces() {
        assert_eq!(normalize("1\u{202f}500\u{2009}kr"), "1 500 kr");
    }

    #[test]
    fn test_normalize_regular_text_unchanged() {
        assert_eq!(normalize("Price: 5000 kr"), "Price: 5000 kr");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = ["", "abc", "5\u{00a0}434\u{00a0}496 kr", "\u{2007}\u{3000}x\u{205f}"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_squash_collapses_whitespace() {
        assert_eq!(squash("  Gaming\u{00a0}\u{00a0}pc \n selges  "), "Gaming pc selges");
    }
}
