//! Core types and shared functionality for pricewatch.
//!
//! This crate provides:
//! - Listing categories, observations and price formatting
//! - Price history store with legacy format migration
//! - Change reporting for notifications
//! - Unified error types
//! - Configuration structures

pub mod category;
pub mod config;
pub mod error;
pub mod history;
pub mod price;
pub mod report;
pub mod text;

pub use category::Category;
pub use config::{AppConfig, ConfigError, EmailConfig, ScheduleMode};
pub use error::Error;
pub use history::{ChangeResult, Direction, HistoryStore, ListingRecord, MigrationReport, Observation};
pub use report::{ChangeEntry, Report, ReportRow, summarize};
