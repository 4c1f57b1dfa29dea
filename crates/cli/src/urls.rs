//! The URL list: one listing URL per line.

use pricewatch_core::Error;
use std::path::Path;

/// Read the URL list, skipping blank lines and `#` comments.
///
/// A missing file is an empty list.
pub fn read_urls(path: &Path) -> Result<Vec<String>, Error> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_urls(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "URL list not found");
            Ok(Vec::new())
        }
        Err(e) => Err(Error::InputList(format!("{}: {e}", path.display()))),
    }
}

pub fn parse_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urls_skips_blanks_and_comments() {
        let content = "# watched listings\nhttps://www.finn.no/mobility/item/1\n\n   \n  https://www.finn.no/recommerce/forsale/item/2  \n#https://www.finn.no/mobility/item/3\n";
        assert_eq!(
            parse_urls(content),
            vec!["https://www.finn.no/mobility/item/1", "https://www.finn.no/recommerce/forsale/item/2"]
        );
    }

    #[test]
    fn test_parse_urls_keeps_order_and_duplicates() {
        let content = "b\na\nb\n";
        assert_eq!(parse_urls(content), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_read_urls_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_urls(&dir.path().join("urls.txt")).unwrap().is_empty());
    }

    #[test]
    fn test_read_urls_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_urls(dir.path()), Err(Error::InputList(_))));
    }
}
