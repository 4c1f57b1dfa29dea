//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Longest accepted loop interval: one week.
const MAX_INTERVAL_HOURS: f64 = 168.0;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `check_interval_hours` is not positive or exceeds one week
    /// - `user_agent` is empty
    /// - `email.smtp_port` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if !(self.check_interval_hours > 0.0 && self.check_interval_hours <= MAX_INTERVAL_HOURS) {
            return Err(ConfigError::Invalid {
                field: "check_interval_hours".into(),
                reason: format!("must be greater than 0 and at most {MAX_INTERVAL_HOURS}"),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.email.smtp_port == 0 {
            return Err(ConfigError::Invalid { field: "email.smtp_port".into(), reason: "must not be zero".into() });
        }

        let email = &self.email;
        if email.smtp_requested() && !email.is_complete() {
            tracing::warn!(
                host_set = email.smtp_host.is_some(),
                user_set = email.smtp_user.is_some(),
                pass_set = email.smtp_pass.is_some(),
                from_set = email.from.is_some(),
                recipients = email.recipients().len(),
                "SMTP settings are incomplete; reports will not be mailed"
            );
        } else if email.outbox_dir.is_some() && !email.has_outbox() {
            tracing::warn!(
                from_set = email.from.is_some(),
                recipients = email.recipients().len(),
                "email outbox is configured but sender or recipients are missing; reports will only be logged"
            );
        }

        Ok(())
    }
}
