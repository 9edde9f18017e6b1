use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tankrelay_api::config::ServerConfig;
use tankrelay_api::router::build_app_router;
use tankrelay_api::state::AppState;
use tankrelay_events::lifecycle::{init_tracing, shutdown_signal};
use tankrelay_events::{transport, AlertLog};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing("tankrelay_api=debug,tankrelay_events=debug,tower_http=debug");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tankrelay-api failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        low_level_threshold = config.low_level_threshold,
        raw_topic = %config.raw_topic,
        alerts_topic = %config.alerts_topic,
        "Loaded server configuration"
    );

    // --- Transport ---
    let transport = transport::connect(&config.transport).await?;

    // --- Alert log ---
    let alert_log = Arc::new(AlertLog::new(config.alert_log_path.clone()));
    tracing::info!(path = %alert_log.path().display(), "Alert log ready");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        transport: Arc::clone(&transport),
        alert_log,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Starting server");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // --- Shutdown ---
    tracing::info!("Server stopped accepting connections, closing transport");
    if let Err(e) = transport.close().await {
        tracing::warn!(error = %e, "Transport did not close cleanly");
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
