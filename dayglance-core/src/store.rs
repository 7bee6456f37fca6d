//! Record store abstraction and boundary parsing
//!
//! The analytics layer reads tasks, events and habits through [`RecordStore`].
//! Stored values are loosely typed (ISO date strings, a JSON-encoded list of
//! completion dates); the helpers here turn them into the typed records in
//! [`crate::types`] and never fail: unparseable values become "missing".

use crate::error::{Error, Result};
use crate::types::{Event, Habit, Task};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// Source of the full current record set.
///
/// Implementations return every record they hold, unpaginated, and return an
/// empty vector (not an error) when there are none.
pub trait RecordStore: Send + Sync {
    /// All tasks
    fn tasks(&self) -> Result<Vec<Task>>;
    /// All events
    fn events(&self) -> Result<Vec<Event>>;
    /// All habits
    fn habits(&self) -> Result<Vec<Habit>>;
}

/// One consistent read of every record type.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    pub tasks: Vec<Task>,
    pub events: Vec<Event>,
    pub habits: Vec<Habit>,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a stored date or date-time string as a local wall-clock instant.
///
/// Accepts RFC 3339 (converted to local time), ISO date-times without an
/// offset, and bare dates (midnight).
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a stored date string; date-times keep only their local date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_instant(raw).map(|dt| dt.date())
}

/// Parse the stored JSON array of completion dates.
///
/// Malformed JSON yields an empty set; individual entries that are not
/// parseable date strings are skipped.
pub fn parse_completed_dates(raw: Option<&str>) -> BTreeSet<NaiveDate> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return BTreeSet::new(),
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed completed_dates, treating as empty");
            return BTreeSet::new();
        }
    };

    entries
        .iter()
        .filter_map(|v| v.as_str())
        .filter_map(|s| {
            let parsed = parse_date(s);
            if parsed.is_none() {
                tracing::debug!(entry = s, "Skipping unparseable completion date");
            }
            parsed
        })
        .collect()
}

/// Parse the stored JSON array of completion dates, rejecting anything that
/// does not parse.
///
/// Used before rewriting the array so that stored history is never dropped.
pub fn parse_completed_dates_strict(raw: Option<&str>) -> Result<BTreeSet<NaiveDate>> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(BTreeSet::new()),
    };

    let entries: Vec<String> = serde_json::from_str(raw)?;
    entries
        .iter()
        .map(|s| {
            parse_date(s)
                .ok_or_else(|| Error::Store(format!("unparseable completion date: {:?}", s)))
        })
        .collect()
}

/// Serialize completion dates as the stored JSON array (`["2024-03-10", ...]`).
pub fn serialize_completed_dates(dates: &BTreeSet<NaiveDate>) -> Result<String> {
    let strings: Vec<String> = dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    Ok(serde_json::to_string(&strings)?)
}
