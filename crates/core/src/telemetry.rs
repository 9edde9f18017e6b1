//! Telemetry snapshot types and boundary parsing.
//!
//! A [`Snapshot`] is parsed exactly once, at the edge of the system, via
//! [`Snapshot::parse`]. Only a body that is not JSON, or that has no
//! `locations` array, is rejected outright. A location or tank entry that
//! cannot be used is left out and reported as a [`SkippedEntry`]; the rest of
//! the snapshot is still evaluated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Timestamp;

/// Inclusive range of valid fill levels, in percent.
pub const LEVEL_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why an inbound payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The body is not JSON at all.
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The `locations` collection is absent or null.
    #[error("payload is missing the `locations` collection")]
    MissingLocations,

    /// The JSON does not have the expected structure.
    #[error("payload has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One sensor's current fill level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Fill level in percent (0–100).
    pub level: f64,
    /// Producer's timestamp, passed through as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// A group of tanks sharing a physical area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(rename = "tanks", alias = "readings")]
    pub readings: Vec<Reading>,
}

/// One full telemetry payload covering every monitored location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub locations: Vec<Location>,
}

/// A part of the payload left out of evaluation, addressed by its JSON path
/// (`locations[0].tanks[2]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// Result of [`Snapshot::parse`]: the usable snapshot plus whatever was
/// dropped from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Deserialize)]
struct RawLocation {
    id: String,
    #[serde(default, alias = "readings")]
    tanks: Option<Vec<Value>>,
}

impl Snapshot {
    /// Parse a raw request body.
    pub fn parse(bytes: &[u8]) -> Result<ParsedSnapshot, PayloadError> {
        let value: Value = serde_json::from_slice(bytes).map_err(PayloadError::Malformed)?;
        Self::from_value(value)
    }

    /// Parse an already-decoded JSON document.
    pub fn from_value(mut value: Value) -> Result<ParsedSnapshot, PayloadError> {
        let locations = match value.get_mut("locations").map(Value::take) {
            None | Some(Value::Null) => return Err(PayloadError::MissingLocations),
            Some(locations) => locations,
        };
        let locations: Vec<Value> =
            serde_json::from_value(locations).map_err(PayloadError::Shape)?;

        let mut skipped = Vec::new();

        let timestamp = match value.get_mut("timestamp").map(Value::take) {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<Timestamp>(raw) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    skipped.push(SkippedEntry::new("timestamp".to_string(), e.to_string()));
                    None
                }
            },
        };

        let locations = locations
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let path = format!("locations[{i}]");
                match parse_location(raw, &path, &mut skipped) {
                    Ok(location) => Some(location),
                    Err(reason) => {
                        skipped.push(SkippedEntry::new(path, reason));
                        None
                    }
                }
            })
            .collect();

        Ok(ParsedSnapshot {
            snapshot: Snapshot {
                timestamp,
                locations,
            },
            skipped,
        })
    }

    /// Total number of readings across all locations.
    pub fn reading_count(&self) -> usize {
        self.locations.iter().map(|l| l.readings.len()).sum()
    }
}

impl SkippedEntry {
    fn new(path: String, reason: String) -> Self {
        Self { path, reason }
    }
}

fn parse_location(
    raw: Value,
    path: &str,
    skipped: &mut Vec<SkippedEntry>,
) -> Result<Location, String> {
    let raw: RawLocation = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    if raw.id.trim().is_empty() {
        return Err("empty location id".to_string());
    }

    let readings = raw
        .tanks
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(j, tank)| match parse_reading(tank) {
            Ok(reading) => Some(reading),
            Err(reason) => {
                skipped.push(SkippedEntry::new(format!("{path}.tanks[{j}]"), reason));
                None
            }
        })
        .collect();

    Ok(Location {
        id: raw.id,
        readings,
    })
}

fn parse_reading(raw: Value) -> Result<Reading, String> {
    let reading: Reading = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    if reading.id.trim().is_empty() {
        return Err("empty tank id".to_string());
    }
    if !reading.level.is_finite() || !LEVEL_RANGE.contains(&reading.level) {
        return Err(format!(
            "tank {} has level {}, expected 0 to 100",
            reading.id, reading.level
        ));
    }
    Ok(reading)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse_clean(body: &[u8]) -> Snapshot {
        let parsed = Snapshot::parse(body).unwrap();
        assert!(parsed.skipped.is_empty(), "unexpected skips: {:?}", parsed.skipped);
        parsed.snapshot
    }

    #[test]
    fn parses_well_formed_snapshot() {
        let body = br#"{
            "timestamp": "2024-05-01T12:00:00Z",
            "locations": [
                {"id": "north", "tanks": [
                    {"id": "t1", "name": "Diesel", "level": 42.5, "lastUpdated": "2024-05-01T11:59:00Z"},
                    {"id": "t2", "name": "Water", "level": 0}
                ]},
                {"id": "south", "tanks": []}
            ]
        }"#;

        let snapshot = parse_clean(body);
        assert_eq!(snapshot.locations.len(), 2);
        assert_eq!(snapshot.reading_count(), 2);
        assert_eq!(snapshot.locations[0].readings[0].level, 42.5);
        assert_eq!(
            snapshot.locations[0].readings[0].last_updated.as_deref(),
            Some("2024-05-01T11:59:00Z")
        );
        assert!(snapshot.locations[0].readings[1].last_updated.is_none());
        assert!(snapshot.timestamp.is_some());
    }

    #[test]
    fn accepts_readings_alias() {
        let body = br#"{"locations": [{"id": "a", "readings": [{"id": "t", "name": "n", "level": 5}]}]}"#;
        assert_eq!(parse_clean(body).locations[0].readings.len(), 1);
    }

    #[test]
    fn rejects_non_json_body() {
        assert_matches!(Snapshot::parse(b"not json"), Err(PayloadError::Malformed(_)));
    }

    #[test]
    fn rejects_missing_locations() {
        assert_matches!(
            Snapshot::parse(br#"{"timestamp": "2024-05-01T12:00:00Z"}"#),
            Err(PayloadError::MissingLocations)
        );
        assert_matches!(
            Snapshot::parse(br#"{"locations": null}"#),
            Err(PayloadError::MissingLocations)
        );
        assert_matches!(Snapshot::parse(b"[1, 2]"), Err(PayloadError::MissingLocations));
    }

    #[test]
    fn rejects_locations_that_are_not_a_list() {
        assert_matches!(
            Snapshot::parse(br#"{"locations": {"id": "a"}}"#),
            Err(PayloadError::Shape(_))
        );
    }

    #[test]
    fn out_of_range_level_skips_only_that_tank() {
        let body = br#"{"locations": [{"id": "a", "tanks": [
            {"id": "t1", "name": "n", "level": 10},
            {"id": "t2", "name": "n", "level": 100.4},
            {"id": "t3", "name": "n", "level": -3}
        ]}]}"#;

        let parsed = Snapshot::parse(body).unwrap();
        let readings = &parsed.snapshot.locations[0].readings;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].id, "t1");

        let paths: Vec<&str> = parsed.skipped.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, ["locations[0].tanks[1]", "locations[0].tanks[2]"]);
        assert!(parsed.skipped[0].reason.contains("100.4"));
    }

    #[test]
    fn name_and_last_updated_pass_through_as_sent() {
        let body = br#"{"locations": [{"id": "a", "tanks": [
            {"id": "t1", "level": 10, "lastUpdated": "2024-05-01 11:59:00"}
        ]}]}"#;

        let reading = &parse_clean(body).locations[0].readings[0];
        assert_eq!(reading.name, "");
        assert_eq!(reading.last_updated.as_deref(), Some("2024-05-01 11:59:00"));
    }

    #[test]
    fn unusable_tanks_and_locations_are_skipped() {
        let body = br#"{"locations": [
            {"id": "a", "tanks": [{"id": "t"}, {"id": "", "level": 1}, {"id": "ok", "level": 1}]},
            {"id": " ", "tanks": []},
            {"tanks": []},
            "north"
        ]}"#;

        let parsed = Snapshot::parse(body).unwrap();
        assert_eq!(parsed.snapshot.locations.len(), 1);
        assert_eq!(parsed.snapshot.locations[0].readings[0].id, "ok");

        let paths: Vec<&str> = parsed.skipped.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "locations[0].tanks[0]",
                "locations[0].tanks[1]",
                "locations[1]",
                "locations[2]",
                "locations[3]",
            ]
        );
    }

    #[test]
    fn bad_snapshot_timestamp_is_dropped() {
        let parsed =
            Snapshot::parse(br#"{"timestamp": "yesterday", "locations": []}"#).unwrap();
        assert!(parsed.snapshot.timestamp.is_none());
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].path, "timestamp");
    }

    #[test]
    fn location_without_tanks_is_empty() {
        let snapshot = parse_clean(br#"{"locations": [{"id": "a"}, {"id": "b", "tanks": null}]}"#);
        assert_eq!(snapshot.reading_count(), 0);
        assert_eq!(snapshot.locations.len(), 2);
    }

    #[test]
    fn empty_locations_is_valid() {
        assert!(parse_clean(br#"{"locations": []}"#).locations.is_empty());
    }
}
