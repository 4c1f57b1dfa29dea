//! Delivery of change reports.
//!
//! - `SmtpNotifier` sends the report through an SMTP relay with STARTTLS.
//! - `OutboxNotifier` drops a ready-to-send `.eml` file into an outbox
//!   directory for a local mail relay to pick up.
//! - `LogNotifier` writes the report to the log.

pub mod message;

pub use message::build_message;

use chrono::Utc;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use pricewatch_core::{EmailConfig, Error, Report};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Receives the change report at the end of a run.
pub trait Notifier {
    fn notify(&self, report: &Report, recipients: &[String]) -> Result<(), Error>;
}

/// Logs each changed row.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &Report, recipients: &[String]) -> Result<(), Error> {
        tracing::info!(subject = %report.subject(), recipients = recipients.len(), "change report");
        for row in report.rows() {
            tracing::info!(
                category = %row.category,
                title = %row.title,
                old = %row.old_price,
                new = %row.new_price,
                delta = %row.delta,
                url = %row.url,
                "price changed"
            );
        }
        Ok(())
    }
}

/// Mails each report through an authenticated SMTP relay.
pub struct SmtpNotifier {
    from: String,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    /// Build from a complete email config.
    ///
    /// # Errors
    ///
    /// `NotifyFailed` when the config is incomplete or the relay host is rejected.
    pub fn from_config(config: &EmailConfig, timeout: Duration) -> Result<Self, Error> {
        let incomplete = || {
            Error::NotifyFailed("email config incomplete: SMTP host, user, password, sender and recipients are required".into())
        };
        if !config.is_complete() {
            return Err(incomplete());
        }
        let (Some(host), Some(user), Some(pass), Some(from)) =
            (&config.smtp_host, &config.smtp_user, &config.smtp_pass, &config.from)
        else {
            return Err(incomplete());
        };

        let transport = SmtpTransport::starttls_relay(host.trim())
            .map_err(|e| Error::NotifyFailed(format!("invalid SMTP host '{host}': {e}")))?
            .port(config.smtp_port)
            .credentials(Credentials::new(user.clone(), pass.clone()))
            .timeout(Some(timeout))
            .build();

        tracing::debug!(host = %host, port = config.smtp_port, "SMTP relay configured");
        Ok(Self { from: from.clone(), transport })
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, report: &Report, recipients: &[String]) -> Result<(), Error> {
        let message = build_message(report, &self.from, recipients, SystemTime::now())?;
        self.transport
            .send(&message)
            .map_err(|e| Error::NotifyFailed(format!("SMTP delivery failed: {e}")))?;

        tracing::info!(recipients = recipients.len(), "email sent");
        Ok(())
    }
}

/// Writes each report as an `.eml` file.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    from: String,
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(from: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self { from: from.into(), dir: dir.into() }
    }

    /// Build from config, or `None` unless sender, recipients and outbox directory are set.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        if !config.has_outbox() {
            return None;
        }
        Some(Self::new(config.from.clone()?, config.outbox_dir.clone()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, raw: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%f");
        let path = self.dir.join(format!("pricewatch_{stamp}.eml"));

        let mut tmp = tempfile::Builder::new().prefix(".pricewatch").suffix(".tmp").tempfile_in(&self.dir)?;
        tmp.write_all(raw)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, report: &Report, recipients: &[String]) -> Result<(), Error> {
        let message = build_message(report, &self.from, recipients, SystemTime::now())?;
        let path = self
            .write(&message.formatted())
            .map_err(|e| Error::NotifyFailed(format!("failed to write {}: {e}", self.dir.display())))?;

        tracing::info!(path = %path.display(), recipients = recipients.len(), "email queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::{Category, ChangeEntry, ChangeResult, summarize};

    fn report() -> Report {
        summarize(&[ChangeEntry {
            key: "https://www.finn.no/realestate/homes/ad.html?finnkode=1".into(),
            category: Category::Realestate,
            title: "Leilighet".into(),
            change: ChangeResult::compare(Some(5_000_000), 4_900_000),
        }])
    }

    #[test]
    fn test_log_notifier_accepts_any_report() {
        assert!(LogNotifier.notify(&report(), &[]).is_ok());
        assert!(LogNotifier.notify(&Report::NoChanges, &["a@example.com".into()]).is_ok());
    }

    #[test]
    fn test_outbox_writes_eml() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = OutboxNotifier::new("monitor@example.com", dir.path().join("outbox"));

        notifier.notify(&report(), &["a@example.com".into()]).unwrap();

        let files: Vec<_> = std::fs::read_dir(notifier.dir()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().and_then(|e| e.to_str()), Some("eml"));

        let raw = std::fs::read_to_string(&files[0]).unwrap();
        assert!(raw.contains("To: a@example.com\r\n"));
        assert!(raw.contains("Subject: Price Monitor: 1 listing changed"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_outbox_requires_recipients() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = OutboxNotifier::new("monitor@example.com", dir.path());
        assert!(matches!(notifier.notify(&report(), &[]), Err(Error::NotifyFailed(_))));
    }

    #[test]
    fn test_outbox_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let notifier = OutboxNotifier::new("monitor@example.com", blocker.join("outbox"));
        assert!(matches!(notifier.notify(&report(), &["a@example.com".into()]), Err(Error::NotifyFailed(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config =
            EmailConfig { from: Some("m@example.com".into()), to: Some("a@example.com".into()), ..Default::default() };
        assert!(OutboxNotifier::from_config(&config).is_none());

        config.outbox_dir = Some(PathBuf::from("outbox"));
        let notifier = OutboxNotifier::from_config(&config).unwrap();
        assert_eq!(notifier.dir(), Path::new("outbox"));

        config.to = None;
        assert!(OutboxNotifier::from_config(&config).is_none());
    }

    fn smtp_config() -> EmailConfig {
        EmailConfig {
            from: Some("monitor@example.com".into()),
            to: Some("a@example.com".into()),
            smtp_host: Some("127.0.0.1".into()),
            smtp_port: 1,
            smtp_user: Some("monitor".into()),
            smtp_pass: Some("secret".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_smtp_requires_complete_config() {
        let config = EmailConfig { smtp_pass: None, ..smtp_config() };
        let result = SmtpNotifier::from_config(&config, Duration::from_secs(1));
        assert!(matches!(result, Err(Error::NotifyFailed(msg)) if msg.contains("incomplete")));
    }

    #[test]
    fn test_smtp_unreachable_relay() {
        let notifier = SmtpNotifier::from_config(&smtp_config(), Duration::from_secs(1)).unwrap();
        let result = notifier.notify(&report(), &["a@example.com".into()]);
        assert!(matches!(result, Err(Error::NotifyFailed(msg)) if msg.starts_with("SMTP delivery failed")));
    }

    #[test]
    fn test_smtp_rejects_bad_recipient_before_sending() {
        let notifier = SmtpNotifier::from_config(&smtp_config(), Duration::from_secs(1)).unwrap();
        let result = notifier.notify(&report(), &["nope".into()]);
        assert!(matches!(result, Err(Error::NotifyFailed(msg)) if msg.contains("invalid email address")));
    }
}
