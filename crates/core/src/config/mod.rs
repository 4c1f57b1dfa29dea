//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRICEWATCH_*)
//! 2. Legacy variables (DATA_DIR, DEBUG, SMTP_HOST, EMAIL_TO, ...)
//! 3. TOML config file (PRICEWATCH_CONFIG_FILE, or ./pricewatch.toml)
//! 4. `config.env` KEY=VALUE file in the data directory
//! 5. Built-in defaults

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

mod legacy;
mod validation;

pub use legacy::LEGACY_ENV_FILE;
pub use validation::ConfigError;

/// Default TOML config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pricewatch.toml";

/// Whether the binary checks once or keeps checking on an interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    #[default]
    Once,
    Loop,
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleMode::Once => "once",
            ScheduleMode::Loop => "loop",
        })
    }
}

impl FromStr for ScheduleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(ScheduleMode::Once),
            "loop" => Ok(ScheduleMode::Loop),
            other => Err(ConfigError::Invalid {
                field: "schedule_mode".into(),
                reason: format!("expected 'once' or 'loop', got '{other}'"),
            }),
        }
    }
}

/// Where change reports are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Sender address.
    ///
    /// Set via PRICEWATCH_EMAIL__FROM or EMAIL_FROM.
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: Option<String>,

    /// Comma-separated recipient list.
    ///
    /// Set via PRICEWATCH_EMAIL__TO or EMAIL_TO.
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: Option<String>,

    /// SMTP relay host, reached with STARTTLS.
    ///
    /// Set via PRICEWATCH_EMAIL__SMTP_HOST or SMTP_HOST.
    #[serde(default, deserialize_with = "lenient_string")]
    pub smtp_host: Option<String>,

    /// Set via PRICEWATCH_EMAIL__SMTP_PORT or SMTP_PORT.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Set via PRICEWATCH_EMAIL__SMTP_USER or SMTP_USER.
    #[serde(default, deserialize_with = "lenient_string")]
    pub smtp_user: Option<String>,

    /// Set via PRICEWATCH_EMAIL__SMTP_PASS or SMTP_PASS.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing)]
    pub smtp_pass: Option<String>,

    /// Directory where rendered messages are dropped for an external transport.
    ///
    /// Set via PRICEWATCH_EMAIL__OUTBOX_DIR. Used only when SMTP is not configured.
    #[serde(default)]
    pub outbox_dir: Option<PathBuf>,
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_pass: None,
            outbox_dir: None,
        }
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

impl EmailConfig {
    /// SMTP host, credentials, sender and recipients are all present.
    pub fn is_complete(&self) -> bool {
        present(self.smtp_host.as_deref())
            && present(self.smtp_user.as_deref())
            && present(self.smtp_pass.as_deref())
            && present(self.from.as_deref())
            && !self.recipients().is_empty()
    }

    /// Sender, recipients and an outbox directory are present.
    pub fn has_outbox(&self) -> bool {
        self.outbox_dir.is_some() && present(self.from.as_deref()) && !self.recipients().is_empty()
    }

    /// Any SMTP setting was given.
    pub fn smtp_requested(&self) -> bool {
        present(self.smtp_host.as_deref()) || present(self.smtp_user.as_deref()) || present(self.smtp_pass.as_deref())
    }

    /// Recipient addresses, split on commas and trimmed.
    pub fn recipients(&self) -> Vec<String> {
        self.to
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Scalar as found in env values, which are parsed before they reach serde.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts `1234` for a string field; env values such as a numeric password arrive as integers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(s) => s,
    }))
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b,
        Scalar::Int(n) => n == 1,
        Scalar::Float(f) => f == 1.0,
        Scalar::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    })
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the URL list, history file and debug dumps.
    ///
    /// Set via PRICEWATCH_DATA_DIR or DATA_DIR.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// URL list, relative to `data_dir` unless absolute.
    #[serde(default = "default_urls_file")]
    pub urls_file: PathBuf,

    /// Price history file, relative to `data_dir` unless absolute.
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Save fetched HTML snapshots under `data_dir/debug_dumps`.
    ///
    /// Set via PRICEWATCH_DEBUG or DEBUG.
    #[serde(default, deserialize_with = "flag")]
    pub debug: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Run once or loop forever. Set via PRICEWATCH_SCHEDULE_MODE or SCHEDULE_MODE.
    #[serde(default)]
    pub schedule_mode: ScheduleMode,

    /// Hours to sleep between checks in loop mode. Set via
    /// PRICEWATCH_CHECK_INTERVAL_HOURS or CHECK_INTERVAL_HOURS.
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: f64,

    #[serde(default)]
    pub email: EmailConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_urls_file() -> PathBuf {
    PathBuf::from("urls.txt")
}

fn default_history_file() -> PathBuf {
    PathBuf::from("price_history.json")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_check_interval_hours() -> f64 {
    4.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            urls_file: default_urls_file(),
            history_file: default_history_file(),
            debug: false,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            schedule_mode: ScheduleMode::Once,
            check_interval_hours: default_check_interval_hours(),
            email: EmailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sleep between checks in loop mode.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs_f64(self.check_interval_hours * 3600.0)
    }

    pub fn urls_path(&self) -> PathBuf {
        self.data_dir.join(&self.urls_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    pub fn debug_dumps_dir(&self) -> PathBuf {
        self.data_dir.join("debug_dumps")
    }

    /// The layered figment without any caller overrides.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PRICEWATCH_` (`__` nests, e.g. `PRICEWATCH_EMAIL__TO`)
    /// 2. Unprefixed legacy variables (`DATA_DIR`, `DEBUG`, `SMTP_HOST`, `EMAIL_TO`, ...)
    /// 3. TOML file from `PRICEWATCH_CONFIG_FILE`, else `./pricewatch.toml` if present
    /// 4. `config.env` in the data directory, else in the working directory
    /// 5. Built-in defaults via `Default::default()`
    pub fn figment() -> Figment {
        let config_path = std::env::var("PRICEWATCH_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = legacy::env_file_path() {
            figment = figment.merge(legacy::env_file(&path));
        }

        figment
            .merge(Toml::file(config_path))
            .merge(legacy::env())
            .merge(
                Env::prefixed("PRICEWATCH_")
                    .ignore(&["config_file"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            )
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extract and validate from an arbitrary figment, e.g. one with CLI overrides merged.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
