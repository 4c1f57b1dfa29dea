//! Migration of persisted history into the current observation shape.
//!
//! Three shapes occur in the wild, sometimes mixed within one key:
//!
//! 1. Flat alternating pairs: `[7500, "2025-01-01T10:00:00", "8 000 kr", "2025-01-02", ...]`
//! 2. Objects with display-string prices: `{"price": "5 434 496 kr", "timestamp": ...}`
//! 3. Current objects: `{"price": 5434496, "title": "...", "timestamp": "...Z"}`
//!
//! Shape detection is per entry. An entry that cannot be migrated is skipped
//! and reported; it never aborts the load.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::Observation;
use crate::Error;
use crate::price::parse_price_value;

/// Counters describing what a migration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Keys present in the input.
    pub keys: usize,
    /// Observations produced.
    pub observations: usize,
    /// Observations converted from a legacy shape.
    pub upgraded: usize,
    /// Human-readable description of every skipped entry.
    pub skipped: Vec<String>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.upgraded == 0 && self.skipped.is_empty()
    }
}

/// Migrate a whole persisted document.
///
/// `now` stamps legacy prices that were stored without a timestamp.
///
/// # Errors
///
/// Returns `Error::Migration` only when the document is not a JSON object;
/// problems inside individual keys or entries are skipped and reported.
pub fn migrate(raw: &Value, now: DateTime<Utc>) -> Result<(BTreeMap<String, Vec<Observation>>, MigrationReport), Error> {
    let Value::Object(keys) = raw else {
        return Err(Error::Migration(format!("expected a JSON object at top level, found {}", kind(raw))));
    };

    let mut report = MigrationReport { keys: keys.len(), ..Default::default() };
    let mut migrated = BTreeMap::new();

    for (key, entries) in keys {
        let Value::Array(entries) = entries else {
            skip(&mut report, key, Error::Migration(format!("expected an array of entries, found {}", kind(entries))));
            continue;
        };
        let observations = migrate_entries(key, entries, now, &mut report);
        report.observations += observations.len();
        migrated.insert(key.clone(), observations);
    }

    Ok((migrated, report))
}

fn migrate_entries(key: &str, entries: &[Value], now: DateTime<Utc>, report: &mut MigrationReport) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(entries.len());
    let mut i = 0;

    while i < entries.len() {
        let (result, consumed) = match &entries[i] {
            Value::Object(map) if map.contains_key("price") => (structured_entry(map, now, report), 1),
            Value::Number(_) | Value::String(_) => flat_pair(&entries[i], entries.get(i + 1), now),
            other => (Err(Error::Migration(format!("unrecognized entry ({})", kind(other)))), 1),
        };

        match result {
            Ok(observation) => observations.push(observation),
            Err(err) => skip(report, &format!("{key}[{i}]"), err),
        }
        i += consumed;
    }

    observations
}

/// Shapes 2 and 3.
fn structured_entry(map: &Map<String, Value>, now: DateTime<Utc>, report: &mut MigrationReport) -> Result<Observation, Error> {
    let price = map.get("price").map_or_else(|| Err(Error::Migration("missing price".into())), price_from_value)?;

    let title = match map.get("title") {
        Some(Value::String(title)) => title.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => return Err(Error::Migration(format!("title must be a string, found {}", kind(other)))),
    };

    let timestamp = match map.get("timestamp") {
        Some(Value::String(ts)) => parse_timestamp(ts).ok_or_else(|| Error::Migration(format!("invalid timestamp {ts:?}")))?,
        Some(Value::Null) | None => now,
        Some(other) => return Err(Error::Migration(format!("timestamp must be a string, found {}", kind(other)))),
    };

    if !matches!(map.get("price"), Some(Value::Number(_))) || !map.get("title").is_some_and(Value::is_string) {
        report.upgraded += 1;
    }

    Ok(Observation { price, title, timestamp })
}

/// Shape 1: a price followed by its timestamp.
///
/// A price with no timestamp after it consumes one slot and is stamped with `now`.
fn flat_pair(price: &Value, next: Option<&Value>, now: DateTime<Utc>) -> (Result<Observation, Error>, usize) {
    if let Value::String(s) = price
        && parse_price_value(s).is_none()
        && parse_timestamp(s).is_some()
    {
        return (Err(Error::Migration(format!("timestamp {s:?} without a preceding price"))), 1);
    }

    let (timestamp, consumed) = match next {
        Some(Value::String(ts)) => match parse_timestamp(ts) {
            Some(timestamp) => (Ok(timestamp), 2),
            None if parse_price_value(ts).is_some() => (Ok(now), 1),
            None => (Err(Error::Migration(format!("invalid timestamp {ts:?}"))), 2),
        },
        _ => (Ok(now), 1),
    };

    let result = match (price_from_value(price), timestamp) {
        (Ok(price), Ok(timestamp)) => Ok(Observation { price, title: String::new(), timestamp }),
        (Err(err), _) | (_, Err(err)) => Err(err),
    };

    (result, consumed)
}

fn price_from_value(value: &Value) -> Result<u64, Error> {
    match value {
        Value::Number(n) => {
            if let Some(price) = n.as_u64() {
                Ok(price)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 && f <= u64::MAX as f64 => Ok(f.trunc() as u64),
                    _ => Err(Error::Migration(format!("price {n} is not a non-negative number"))),
                }
            }
        }
        Value::String(s) => parse_price_value(s).ok_or_else(|| Error::Migration(format!("non-numeric price {s:?}"))),
        other => Err(Error::Migration(format!("price must be a number or string, found {}", kind(other)))),
    }
}

/// Parse the timestamp spellings found in history files.
///
/// RFC 3339 with offset, naive date-times (taken as UTC) and bare dates
/// (midnight UTC) are accepted.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn skip(report: &mut MigrationReport, location: &str, err: Error) {
    tracing::warn!(entry = location, error = %err, "skipping history entry");
    report.skipped.push(format!("{location}: {err}"));
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const URL: &str = "https://www.finn.no/recommerce/forsale/item/123";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 8, 12, 0, 0).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn run(raw: Value) -> (BTreeMap<String, Vec<Observation>>, MigrationReport) {
        migrate(&raw, now()).unwrap()
    }

    fn remigrate(migrated: &BTreeMap<String, Vec<Observation>>) -> BTreeMap<String, Vec<Observation>> {
        let value = serde_json::to_value(migrated).unwrap();
        let (again, report) = migrate(&value, now()).unwrap();
        assert!(report.is_clean(), "{report:?}");
        again
    }

    #[test]
    fn test_flat_alternating_pairs() {
        let (migrated, report) = run(json!({ URL: [7500, "2025-01-01T10:00:00", 8000, "2025-01-02T14:30:00"] }));

        let entries = &migrated[URL];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], Observation::new(7500, "", ts(2025, 1, 1, 10, 0, 0)));
        assert_eq!(entries[1], Observation::new(8000, "", ts(2025, 1, 2, 14, 30, 0)));
        assert_eq!(report.upgraded, 0);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_flat_pairs_with_string_prices() {
        let (migrated, _) = run(json!({ URL: ["5 434 496 kr", "2025-01-01", "5\u{00a0}434\u{00a0}495 kr", "2025-01-02"] }));

        let entries = &migrated[URL];
        assert_eq!(entries[0].price, 5_434_496);
        assert_eq!(entries[0].timestamp, ts(2025, 1, 1, 0, 0, 0));
        assert_eq!(entries[1].price, 5_434_495);
    }

    #[test]
    fn test_flat_trailing_price_without_timestamp() {
        let (migrated, _) = run(json!({ URL: [7500, "2025-01-01T10:00:00", 8000] }));

        let entries = &migrated[URL];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].price, 8000);
        assert_eq!(entries[1].timestamp, now());
    }

    #[test]
    fn test_structured_string_prices() {
        let (migrated, report) = run(json!({
            URL: [{"price": "5 434 496 kr", "timestamp": "2025-03-01T08:00:00+00:00"}]
        }));

        assert_eq!(migrated[URL], vec![Observation::new(5_434_496, "", ts(2025, 3, 1, 8, 0, 0))]);
        assert_eq!(report.upgraded, 1);
    }

    #[test]
    fn test_current_format_preserved() {
        let (migrated, report) = run(json!({
            URL: [
                {"price": 5000000, "title": "Pen leilighet i sentrum", "timestamp": "2026-02-01T10:00:00Z"},
                {"price": 4900000, "title": "Pen leilighet i sentrum - prisreduksjon!", "timestamp": "2026-02-05T10:00:00Z"}
            ]
        }));

        let entries = &migrated[URL];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].price, 5_000_000);
        assert_eq!(entries[0].title, "Pen leilighet i sentrum");
        assert!(report.is_clean());
    }

    #[test]
    fn test_null_title_becomes_empty() {
        let (migrated, _) = run(json!({ URL: [{"price": 7500, "title": null, "timestamp": "2025-01-01T10:00:00"}] }));
        assert_eq!(migrated[URL][0].title, "");
    }

    #[test]
    fn test_mixed_shapes_within_one_key() {
        let (migrated, _) = run(json!({
            URL: [
                7500, "2025-01-01T10:00:00",
                {"price": 8000, "title": "Updated Item", "timestamp": "2025-01-02T14:30:00"},
                {"price": "8 250 kr", "timestamp": "2025-01-02T20:00:00"},
                8500, "2025-01-03T09:15:00"
            ]
        }));

        let prices: Vec<u64> = migrated[URL].iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![7500, 8000, 8250, 8500]);
        assert_eq!(migrated[URL][1].title, "Updated Item");
        assert_eq!(migrated[URL][3].timestamp, ts(2025, 1, 3, 9, 15, 0));
    }

    #[test]
    fn test_migration_is_idempotent_for_all_shapes() {
        let shapes = [
            json!({ URL: [7500, "2025-01-01T10:00:00", "8 000 kr", "2025-01-02T14:30:00"] }),
            json!({ URL: [{"price": "5 434 496 kr", "timestamp": "2025-01-01T10:00:00"}] }),
            json!({ URL: [{"price": 5434496, "title": "Hus", "timestamp": "2025-01-01T10:00:00Z"}] }),
        ];

        for shape in shapes {
            let (once, _) = run(shape);
            let twice = remigrate(&once);
            assert_eq!(once, twice);
            assert!(once[URL].iter().all(|o| o.timestamp <= now()));
        }
    }

    #[test]
    fn test_corrupt_entry_does_not_block_other_keys() {
        let other = "https://www.finn.no/mobility/item/447730470";
        let (migrated, report) = run(json!({
            URL: [{"price": "ikke en pris", "timestamp": "2025-01-01T10:00:00"}, {"price": 100, "timestamp": "2025-01-02"}],
            other: [{"price": 150000, "title": "BMW 3-serie", "timestamp": "2026-02-06T14:30:00"}]
        }));

        assert_eq!(migrated[URL].len(), 1);
        assert_eq!(migrated[URL][0].price, 100);
        assert_eq!(migrated[other][0].price, 150_000);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].contains("non-numeric price"));
    }

    #[test]
    fn test_flat_corrupt_price_skips_its_pair() {
        let (migrated, report) = run(json!({ URL: ["abc", "2025-01-01T10:00:00", 7500, "2025-01-02T10:00:00"] }));

        assert_eq!(migrated[URL].len(), 1);
        assert_eq!(migrated[URL][0].price, 7500);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_invalid_timestamp_skips_entry() {
        let (migrated, report) = run(json!({ URL: [{"price": 1, "timestamp": "yesterday"}, {"price": 2, "timestamp": "2025-01-01"}] }));

        assert_eq!(migrated[URL].len(), 1);
        assert!(report.skipped[0].contains("invalid timestamp"));
    }

    #[test]
    fn test_non_array_key_is_skipped() {
        let (migrated, report) = run(json!({ URL: "oops", "other": [] }));

        assert!(!migrated.contains_key(URL));
        assert!(migrated.contains_key("other"));
        assert_eq!(report.keys, 2);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_unrecognized_entries_are_skipped() {
        let (migrated, report) = run(json!({ URL: [null, true, {"no_price": 1}, 7500, "2025-01-01"] }));

        assert_eq!(migrated[URL].len(), 1);
        assert_eq!(report.skipped.len(), 3);
    }

    #[test]
    fn test_negative_price_rejected() {
        let (migrated, report) = run(json!({ URL: [{"price": -5, "timestamp": "2025-01-01"}] }));

        assert!(migrated[URL].is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_float_price_truncated() {
        let (migrated, _) = run(json!({ URL: [7500.0, "2025-01-01"] }));
        assert_eq!(migrated[URL][0].price, 7500);
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(matches!(migrate(&json!([1, 2]), now()), Err(Error::Migration(_))));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = ts(2026, 2, 8, 8, 57, 19);
        assert_eq!(parse_timestamp("2026-02-08T08:57:19Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08T08:57:19+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08T09:57:19+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08T08:57:19"), Some(expected));
        assert_eq!(parse_timestamp("2026-02-08 08:57:19"), Some(expected));
        assert!(parse_timestamp("2026-02-08T08:57:19.123456+00:00").is_some());
        assert_eq!(parse_timestamp("2026-02-08"), Some(ts(2026, 2, 8, 0, 0, 0)));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
