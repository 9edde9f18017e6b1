use std::sync::Arc;

use tankrelay_events::{AlertLog, Transport};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Pub/sub client used for both the raw and the alerts topic.
    pub transport: Arc<dyn Transport>,
    /// Local append-only record of every alert the server emitted.
    pub alert_log: Arc<AlertLog>,
}
