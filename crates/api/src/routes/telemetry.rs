use axum::routing::post;
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// Telemetry routes mounted under `/api/v1`.
///
/// ```text
/// POST /telemetry                     -> ingest
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/telemetry", post(telemetry::ingest))
}
