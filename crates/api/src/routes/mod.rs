pub mod health;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /telemetry                                       ingest snapshot (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(telemetry::router())
}
