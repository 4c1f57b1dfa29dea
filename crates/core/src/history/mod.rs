//! Price history keyed by listing URL.
//!
//! The store is loaded once per run (migrating legacy shapes on the way in),
//! mutated in memory as observations arrive, and written back atomically.
//!
//! - Observations are append-only and kept in insertion order.
//! - Change detection compares against the immediately preceding observation.
//! - Unchanged observations are still appended every run.

pub mod migrations;
pub mod persist;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use migrations::MigrationReport;

/// One price sighting for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Whole kroner.
    pub price: u64,
    /// Listing title, empty when extraction found none.
    #[serde(default)]
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(price: u64, title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { price, title: title.into(), timestamp }
    }

    /// Observation stamped with the current instant.
    pub fn now(price: u64, title: impl Into<String>) -> Self {
        Self::new(price, title, Utc::now())
    }
}

/// All observations for one listing, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRecord {
    key: String,
    observations: Vec<Observation>,
}

impl ListingRecord {
    fn new(key: String) -> Self {
        Self { key, observations: Vec::new() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Direction of a price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

/// Outcome of recording an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeResult {
    pub changed: bool,
    pub previous_price: Option<u64>,
    pub new_price: u64,
    pub direction: Direction,
}

impl ChangeResult {
    /// Compare a new price against the previous one, if any.
    pub fn compare(previous_price: Option<u64>, new_price: u64) -> Self {
        let direction = match previous_price {
            Some(prev) if new_price > prev => Direction::Up,
            Some(prev) if new_price < prev => Direction::Down,
            _ => Direction::None,
        };
        Self { changed: direction != Direction::None, previous_price, new_price, direction }
    }

    /// True when there was no earlier observation to compare with.
    pub fn is_first_seen(&self) -> bool {
        self.previous_price.is_none()
    }

    /// Signed difference `new - previous`; zero on first sighting.
    pub fn delta(&self) -> i64 {
        match self.previous_price {
            Some(prev) => i64::try_from(self.new_price).unwrap_or(i64::MAX) - i64::try_from(prev).unwrap_or(i64::MAX),
            None => 0,
        }
    }
}

/// Mapping of listing key to its observation history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    records: BTreeMap<String, ListingRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation and report how it compares to the previous one.
    ///
    /// A key seen for the first time yields `changed = false`.
    pub fn record_observation(&mut self, key: &str, observation: Observation) -> ChangeResult {
        let record = self.records.entry(key.to_string()).or_insert_with(|| ListingRecord::new(key.to_string()));

        let previous = record.last().map(|o| o.price);
        let result = ChangeResult::compare(previous, observation.price);

        tracing::debug!(key, ?previous, new = observation.price, changed = result.changed, "recorded observation");
        record.observations.push(observation);

        result
    }

    pub fn get(&self, key: &str) -> Option<&ListingRecord> {
        self.records.get(key)
    }

    /// Most recent observation for `key`.
    pub fn last(&self, key: &str) -> Option<&Observation> {
        self.records.get(key).and_then(ListingRecord::last)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ListingRecord> {
        self.records.values()
    }

    /// Number of listings tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, Vec<Observation>>) -> Self {
        let records = entries
            .into_iter()
            .map(|(key, observations)| (key.clone(), ListingRecord { key, observations }))
            .collect();
        Self { records }
    }

    pub(crate) fn to_entries(&self) -> BTreeMap<&str, &[Observation]> {
        self.records.iter().map(|(key, record)| (key.as_str(), record.observations())).collect()
    }
}
