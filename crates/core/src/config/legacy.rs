//! Environment names used by earlier deployments.
//!
//! Plain variables such as `DATA_DIR` or `SMTP_HOST`, and the `config.env`
//! KEY=VALUE file found in the data directory, map onto the same fields as
//! their `PRICEWATCH_*` counterparts.

use std::path::{Path, PathBuf};

use figment::{Figment, providers::Serialized, value::Value};

/// KEY=VALUE file read from the data directory, then the working directory.
pub const LEGACY_ENV_FILE: &str = "config.env";

struct LegacyKey {
    name: &'static str,
    path: &'static str,
    /// Kept verbatim, so `SMTP_PASS=0123` stays a string.
    text: bool,
}

const LEGACY_KEYS: &[LegacyKey] = &[
    LegacyKey { name: "DATA_DIR", path: "data_dir", text: true },
    LegacyKey { name: "DEBUG", path: "debug", text: false },
    LegacyKey { name: "SCHEDULE_MODE", path: "schedule_mode", text: true },
    LegacyKey { name: "CHECK_INTERVAL_HOURS", path: "check_interval_hours", text: false },
    LegacyKey { name: "EMAIL_FROM", path: "email.from", text: true },
    LegacyKey { name: "EMAIL_TO", path: "email.to", text: true },
    LegacyKey { name: "SMTP_HOST", path: "email.smtp_host", text: true },
    LegacyKey { name: "SMTP_PORT", path: "email.smtp_port", text: false },
    LegacyKey { name: "SMTP_USER", path: "email.smtp_user", text: true },
    LegacyKey { name: "SMTP_PASS", path: "email.smtp_pass", text: true },
];

fn lookup(name: &str) -> Option<&'static LegacyKey> {
    LEGACY_KEYS.iter().find(|key| key.name.eq_ignore_ascii_case(name.trim()))
}

fn merge_value(figment: Figment, key: &LegacyKey, raw: &str) -> Figment {
    let value = if key.text {
        Value::from(raw)
    } else {
        raw.trim().parse::<Value>().unwrap_or_else(|_| Value::from(raw))
    };
    figment.merge(Serialized::default(key.path, value))
}

/// Legacy variables set in the process environment.
pub(super) fn env() -> Figment {
    LEGACY_KEYS.iter().fold(Figment::new(), |figment, key| match std::env::var(key.name) {
        Ok(raw) => merge_value(figment, key, &raw),
        Err(_) => figment,
    })
}

/// Data directory as seen before any file is read: `PRICEWATCH_DATA_DIR`,
/// then `DATA_DIR`, then the working directory.
fn data_dir() -> PathBuf {
    std::env::var_os("PRICEWATCH_DATA_DIR")
        .or_else(|| std::env::var_os("DATA_DIR"))
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// The `config.env` file to read, if any exists.
pub(super) fn env_file_path() -> Option<PathBuf> {
    [data_dir().join(LEGACY_ENV_FILE), PathBuf::from(LEGACY_ENV_FILE)].into_iter().find(|path| path.is_file())
}

/// Known keys of a KEY=VALUE file as a provider. `DATA_DIR` is ignored since
/// the file is located through it.
pub(super) fn env_file(path: &Path) -> Figment {
    let mut figment = Figment::new();

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read env file");
            return figment;
        }
    };

    for entry in entries {
        let (key, raw) = match entry {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping env file line");
                continue;
            }
        };

        match lookup(&key) {
            Some(legacy) if legacy.path == "data_dir" => {}
            Some(legacy) => figment = merge_value(figment, legacy, &raw),
            None => tracing::debug!(path = %path.display(), key, "ignoring unknown env file key"),
        }
    }

    figment
}
