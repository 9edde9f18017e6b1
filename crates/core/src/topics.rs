//! Default pub/sub topic names.
//!
//! Both the API server and the alert worker fall back to these when the
//! corresponding environment variable is not set, so the two processes agree
//! on the alert topic out of the box.

/// Full, unfiltered telemetry snapshots as received by the ingest endpoint.
pub const TOPIC_RAW: &str = "tanks.raw";

/// Low-level alerts derived from each snapshot.
pub const TOPIC_ALERTS: &str = "tanks.alerts";
