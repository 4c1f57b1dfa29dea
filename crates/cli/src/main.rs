//! pricewatch entry point.
//!
//! Checks the listed finn.no URLs once or on an interval and reports price
//! changes. Logging goes to stderr; the per-run summary goes to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::Serialized;
use pricewatch_client::{FetchConfig, HttpFetcher, LogNotifier, Notifier, OutboxNotifier, SmtpNotifier};
use pricewatch_core::{AppConfig, ScheduleMode};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod runner;
mod urls;

use runner::{RunSummary, Runner};

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(about = "Watch finn.no listings for price changes")]
#[command(version)]
struct Cli {
    /// Execute a check; without this flag only the banner is printed
    #[arg(long)]
    run: bool,

    /// Check once, or keep checking on an interval
    #[arg(long, value_name = "once|loop")]
    schedule_mode: Option<ScheduleMode>,

    /// Hours between checks in loop mode
    #[arg(long, value_name = "HOURS")]
    check_interval_hours: Option<f64>,

    /// Debug logging and HTML debug dumps
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Directory holding urls.txt and the price history
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

/// Flags that override file and environment configuration.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule_mode: Option<ScheduleMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_interval_hours: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            schedule_mode: self.schedule_mode,
            check_interval_hours: self.check_interval_hours,
            debug: self.verbose,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.run {
        println!("pricewatch v{}", env!("CARGO_PKG_VERSION"));
        println!("Pass --run to check the listed URLs.");
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose, cli.log_json);

    if let Err(e) = run(&cli) {
        let error = format!("{e:#}");
        tracing::error!(%error, "pricewatch stopped");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: &Cli) -> Result<()> {
    let figment = AppConfig::figment().merge(Serialized::defaults(cli.overrides()));
    let config = AppConfig::from_figment(figment).context("failed to load configuration")?;

    let fetcher = HttpFetcher::new(FetchConfig::from(&config))?;
    let notifier = notifier_for(&config);
    let mode = config.schedule_mode;
    let runner = Runner::new(config, Box::new(fetcher), notifier);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %mode,
        data_dir = %runner.config().data_dir.display(),
        "pricewatch starting"
    );

    match mode {
        ScheduleMode::Once => {
            let summary = runner.run_check()?;
            print_summary(&summary);
            Ok(())
        }
        ScheduleMode::Loop => loop {
            match runner.run_check() {
                Ok(summary) => print_summary(&summary),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => tracing::error!(code = e.code(), error = %e, "check failed"),
            }

            tracing::info!(hours = runner.config().check_interval_hours, "sleeping until next check");
            std::thread::sleep(runner.config().check_interval());
        },
    }
}

/// SMTP when fully configured, else the outbox, else the log.
fn notifier_for(config: &AppConfig) -> Box<dyn Notifier> {
    if config.email.is_complete() {
        match SmtpNotifier::from_config(&config.email, config.timeout()) {
            Ok(smtp) => return Box::new(smtp),
            Err(e) => tracing::warn!(error = %e, "SMTP unavailable"),
        }
    }

    match OutboxNotifier::from_config(&config.email) {
        Some(outbox) => Box::new(outbox),
        None => {
            tracing::info!("email not configured, change reports go to the log");
            Box::new(LogNotifier)
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Processed {} URL(s): {} changed, {} first seen, {} unchanged, {} failed",
        summary.processed,
        summary.changed,
        summary.first_seen,
        summary.unchanged,
        summary.failures.len()
    );
    for failure in &summary.failures {
        println!("  {}: {}", failure.key, failure.error);
    }
    if summary.processed > 0 && summary.succeeded() == 0 {
        tracing::warn!("no listing could be checked");
    }
}
