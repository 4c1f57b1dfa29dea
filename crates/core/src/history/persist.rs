//! Loading and atomically saving the history file.
//!
//! The file is a JSON object mapping listing URL to an array of observations.
//! Saves go to a temporary file in the same directory which is synced and then
//! renamed over the target, so a crash mid-write leaves the previous file intact.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use super::{HistoryStore, MigrationReport, migrations};
use crate::Error;

impl HistoryStore {
    /// Load the history at `path`, migrating legacy shapes.
    ///
    /// A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// - `Error::Persistence` if the file exists but cannot be read
    /// - `Error::HistoryCorrupt` if it is not a JSON object
    pub fn load(path: &Path) -> Result<Self, Error> {
        Self::load_with_report(path).map(|(store, _)| store)
    }

    /// Like [`HistoryStore::load`], also returning what migration did.
    pub fn load_with_report(path: &Path) -> Result<(Self, MigrationReport), Error> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no history file yet, starting empty");
                return Ok((Self::new(), MigrationReport::default()));
            }
            Err(e) => return Err(Error::persistence(path, e)),
        };

        let corrupt = |reason: String| Error::HistoryCorrupt { path: path.display().to_string(), reason };

        let raw: Value = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        let (entries, report) = migrations::migrate(&raw, Utc::now()).map_err(|e| corrupt(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            listings = report.keys,
            observations = report.observations,
            upgraded = report.upgraded,
            skipped = report.skipped.len(),
            "loaded price history"
        );

        Ok((Self::from_entries(entries), report))
    }

    /// Write the complete store to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` on any I/O failure; the existing file at
    /// `path` is left untouched in that case.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| Error::persistence(path, e))?;

        let json = serde_json::to_vec_pretty(&self.to_entries()).map_err(|e| Error::persistence(path, e.into()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".price_history")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::persistence(path, e))?;
        tmp.write_all(&json).map_err(|e| Error::persistence(path, e))?;
        tmp.write_all(b"\n").map_err(|e| Error::persistence(path, e))?;
        tmp.as_file().sync_all().map_err(|e| Error::persistence(path, e))?;
        tmp.persist(path).map_err(|e| Error::persistence(path, e.error))?;

        tracing::debug!(path = %path.display(), listings = self.len(), bytes = json.len(), "saved price history");
        Ok(())
    }
}
