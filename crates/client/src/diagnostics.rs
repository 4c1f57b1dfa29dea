//! Raw HTML snapshots for diagnosing extraction failures.

use chrono::{DateTime, Utc};
use pricewatch_core::Category;
use std::path::PathBuf;

/// Characters of the URL kept in a dump filename.
const URL_CHARS: usize = 50;

/// Writes fetched pages to a dump directory when enabled.
#[derive(Debug, Clone)]
pub struct DebugDumps {
    dir: PathBuf,
    enabled: bool,
}

impl DebugDumps {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self { dir: dir.into(), enabled }
    }

    /// Save `html` for `url`. Returns the written path, or `None` when
    /// disabled or on failure. Failures are logged and never propagate.
    pub fn save(&self, url: &str, html: &str, category: Category) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        let path = self.dir.join(dump_file_name(url, category, Utc::now()));
        let written = std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, html));

        match written {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "saved debug dump");
                Some(path)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "failed to save debug dump");
                None
            }
        }
    }
}

/// `<YYYYmmdd_HHMMSS>_<category>_<sanitized url prefix>.html`
pub fn dump_file_name(url: &str, category: Category, at: DateTime<Utc>) -> String {
    let safe_url: String =
        url.chars().take(URL_CHARS).map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
    format!("{}_{category}_{safe_url}.html", at.format("%Y%m%d_%H%M%S"))
}
