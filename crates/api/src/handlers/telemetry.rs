//! Telemetry ingest handler.
//!
//! Takes a full snapshot, republishes it byte-for-byte on the raw topic, runs
//! the low-level evaluator and publishes any resulting alert on the alerts
//! topic. The alert is also appended to the local alert log.
//!
//! Tank entries that cannot be evaluated are skipped with a warning; they
//! still reach the raw topic with the rest of the body.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tankrelay_core::alert::Alert;
use tankrelay_core::telemetry::{ParsedSnapshot, Snapshot};
use tankrelay_core::thresholds::evaluate_snapshot;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Outcome of one ingest call.
#[derive(Debug, Serialize)]
pub struct IngestSummary {
    /// The raw snapshot reached the broker client.
    pub published: bool,
    /// Locations with at least one tank at or below the threshold.
    pub alerted_locations: usize,
    /// Tanks at or below the threshold.
    pub alerted_tanks: usize,
    /// Entries left out of evaluation.
    pub skipped_entries: usize,
}

/// POST /api/v1/telemetry
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<DataResponse<IngestSummary>>> {
    let ParsedSnapshot { snapshot, skipped } = match Snapshot::parse(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Rejected telemetry snapshot");
            return Err(e.into());
        }
    };

    for entry in &skipped {
        tracing::warn!(path = %entry.path, reason = %entry.reason, "Skipped telemetry entry");
    }

    tracing::debug!(
        locations = snapshot.locations.len(),
        tanks = snapshot.reading_count(),
        "Telemetry snapshot received"
    );

    if let Err(e) = state
        .transport
        .publish(&state.config.raw_topic, body.to_vec())
        .await
    {
        record_error(&state, &format!("raw snapshot not published: {e}")).await;
        return Err(e.into());
    }

    let Some(alert) =
        evaluate_snapshot(&snapshot, state.config.low_level_threshold, Utc::now())
    else {
        return Ok(Json(DataResponse {
            data: IngestSummary {
                published: true,
                alerted_locations: 0,
                alerted_tanks: 0,
                skipped_entries: skipped.len(),
            },
        }));
    };

    publish_alert(&state, &alert).await?;

    Ok(Json(DataResponse {
        data: IngestSummary {
            published: true,
            alerted_locations: alert.locations.len(),
            alerted_tanks: alert.tank_count(),
            skipped_entries: skipped.len(),
        },
    }))
}

/// Publish the alert and record it in the alert log.
///
/// A log write failure is reported but does not fail the request; the alert
/// already left the process.
async fn publish_alert(state: &AppState, alert: &Alert) -> AppResult<()> {
    let payload = alert.to_json_vec()?;

    if let Err(e) = state
        .transport
        .publish(&state.config.alerts_topic, payload)
        .await
    {
        record_error(state, &format!("alert not published: {e}")).await;
        return Err(e.into());
    }

    tracing::info!(
        topic = %state.config.alerts_topic,
        locations = alert.locations.len(),
        tanks = alert.tank_count(),
        "Low-level alert published"
    );

    if let Err(e) = state.alert_log.append_alert(alert).await {
        tracing::error!(error = %e, "Failed to append alert to the alert log");
    }
    Ok(())
}

async fn record_error(state: &AppState, message: &str) {
    if let Err(e) = state.alert_log.append_error(message, None).await {
        tracing::error!(error = %e, "Failed to append error to the alert log");
    }
}
