//! Low-level threshold evaluation for tank readings.
//!
//! Pure logic: no I/O, no clock reads. The caller passes the time the alert
//! should carry, so identical inputs always produce identical alerts.

use crate::alert::{Alert, AlertKind, LocationAlert, TankAlert};
use crate::telemetry::{Location, Reading, Snapshot};
use crate::types::Timestamp;

/// Tanks at or below this fill level (percent) raise a low-level alert.
pub const LOW_LEVEL_THRESHOLD: f64 = 25.0;

/// Upper fill level (percent). No alerting rule uses it yet.
pub const HIGH_LEVEL_THRESHOLD: f64 = 90.0;

/// Evaluate every location and return an alert when at least one tank is at
/// or below `low_threshold`.
///
/// Locations without qualifying tanks are left out of the alert entirely.
pub fn evaluate(
    locations: &[Location],
    low_threshold: f64,
    observed_at: Timestamp,
) -> Option<Alert> {
    let summaries: Vec<LocationAlert> = locations
        .iter()
        .filter_map(|location| summarize_location(location, low_threshold))
        .collect();

    if summaries.is_empty() {
        return None;
    }

    Some(Alert {
        kind: AlertKind::LowLevel,
        timestamp: observed_at,
        threshold: low_threshold,
        locations: summaries,
    })
}

/// Evaluate a whole snapshot, stamping the alert with the snapshot's own
/// timestamp or `fallback` when the producer did not send one.
pub fn evaluate_snapshot(
    snapshot: &Snapshot,
    low_threshold: f64,
    fallback: Timestamp,
) -> Option<Alert> {
    evaluate(
        &snapshot.locations,
        low_threshold,
        snapshot.timestamp.unwrap_or(fallback),
    )
}

/// Scaled deficits are snapped to six fractional digits before the final
/// rounding, so binary noise below the sixth decimal cannot move a `.5` case.
const SNAP_SCALE: f64 = 1e6;

/// Deficit below the threshold, rounded to 2 decimal places (half away from
/// zero).
///
/// Rounds the decimal value the producer sent, not its binary approximation:
/// `25 - 24.995` is `0.00499999...` in `f64` but yields `0.01` here.
pub fn deficit(threshold: f64, level: f64) -> f64 {
    let cents = (threshold - level) * 100.0;
    let snapped = (cents * SNAP_SCALE).round() / SNAP_SCALE;
    snapped.round() / 100.0
}

fn summarize_location(location: &Location, low_threshold: f64) -> Option<LocationAlert> {
    let tanks: Vec<TankAlert> = location
        .readings
        .iter()
        .filter(|r| r.level <= low_threshold)
        .map(|r| tank_alert(r, low_threshold))
        .collect();

    if tanks.is_empty() {
        return None;
    }

    Some(LocationAlert {
        location_id: location.id.clone(),
        total_tanks: location.readings.len(),
        low_level_tanks: tanks.len(),
        tanks,
    })
}

fn tank_alert(reading: &Reading, threshold: f64) -> TankAlert {
    TankAlert {
        id: reading.id.clone(),
        name: reading.name.clone(),
        level: reading.level,
        last_updated: reading.last_updated.clone(),
        threshold,
        deficit: deficit(threshold, reading.level),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
