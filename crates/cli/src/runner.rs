//! One check over the URL list.

use pricewatch_client::{DebugDumps, Extractor, Fetcher, FinnExtractor, ListingUrl, Notifier};
use pricewatch_core::{AppConfig, ChangeEntry, Error, HistoryStore, Report, summarize};

use crate::urls::read_urls;

/// A listing that could not be checked this run.
#[derive(Debug)]
pub struct Failure {
    pub key: String,
    pub error: Error,
}

/// Tally of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub unchanged: usize,
    pub first_seen: usize,
    pub changed: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failures.len()
    }
}

enum Outcome {
    FirstSeen,
    Unchanged,
    Changed(ChangeEntry),
}

/// Fetches, parses and records every listing in the URL list.
pub struct Runner {
    config: AppConfig,
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    notifier: Box<dyn Notifier>,
    dumps: DebugDumps,
}

impl Runner {
    pub fn new(config: AppConfig, fetcher: Box<dyn Fetcher>, notifier: Box<dyn Notifier>) -> Self {
        let dumps = DebugDumps::new(config.debug_dumps_dir(), config.debug);
        Self { config, fetcher, extractor: Box::new(FinnExtractor), notifier, dumps }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one check.
    ///
    /// Per-listing failures are collected in the summary. Errors returned
    /// from here concern the URL list or the history file; the history is
    /// saved before any notification is attempted.
    pub fn run_check(&self) -> Result<RunSummary, Error> {
        let urls = read_urls(&self.config.urls_path())?;
        let mut summary = RunSummary::default();

        if urls.is_empty() {
            tracing::info!("no URLs to process");
            return Ok(summary);
        }

        let history_path = self.config.history_path();
        let (mut history, migration) = HistoryStore::load_with_report(&history_path)?;
        if !migration.is_clean() {
            tracing::warn!(skipped = migration.skipped.len(), upgraded = migration.upgraded, "history migrated from legacy entries");
        }

        tracing::info!(count = urls.len(), "processing URLs");
        let mut changes = Vec::new();

        for line in &urls {
            summary.processed += 1;
            match self.check_listing(&mut history, line) {
                Ok(Outcome::FirstSeen) => summary.first_seen += 1,
                Ok(Outcome::Unchanged) => summary.unchanged += 1,
                Ok(Outcome::Changed(entry)) => {
                    summary.changed += 1;
                    changes.push(entry);
                }
                Err(error) => {
                    tracing::warn!(url = %line, code = error.code(), %error, "listing failed");
                    summary.failures.push(Failure { key: line.clone(), error });
                }
            }
        }

        history.save(&history_path)?;

        let report = summarize(&changes);
        self.deliver(&report);

        tracing::info!(
            processed = summary.processed,
            changed = summary.changed,
            first_seen = summary.first_seen,
            unchanged = summary.unchanged,
            failures = summary.failures.len(),
            "check finished"
        );

        Ok(summary)
    }

    fn check_listing(&self, history: &mut HistoryStore, line: &str) -> Result<Outcome, Error> {
        let listing = ListingUrl::parse(line)?;

        let response = self.fetcher.fetch(&listing.url)?;
        self.dumps.save(&listing.key, &response.body, listing.category);
        let response = response.error_for_status()?;

        let parsed = self.extractor.extract(&response.body, listing.category, &listing.key)?;
        tracing::info!(url = %listing.key, category = %listing.category, price = parsed.price, title = %parsed.title, strategy = %parsed.strategy, "parsed listing");

        let title = if parsed.title.is_empty() {
            history.last(&listing.key).map(|o| o.title.clone()).unwrap_or_default()
        } else {
            parsed.title.clone()
        };

        let change = history.record_observation(&listing.key, parsed.into());

        if change.is_first_seen() {
            tracing::info!(url = %listing.key, "first entry");
            Ok(Outcome::FirstSeen)
        } else if change.changed {
            tracing::info!(url = %listing.key, old = ?change.previous_price, new = change.new_price, "price changed");
            Ok(Outcome::Changed(ChangeEntry { key: listing.key, category: listing.category, title, change }))
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    fn deliver(&self, report: &Report) {
        if !report.has_changes() {
            tracing::info!("no changes");
            return;
        }

        let recipients = self.config.email.recipients();
        if let Err(error) = self.notifier.notify(report, &recipients) {
            tracing::error!(code = error.code(), %error, "notification failed");
        }
    }
}
