//! Alert worker: subscribes to the alerts topic and logs each alert or
//! forwards it to a webhook, depending on `ALERT_SINK`.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use tankrelay_events::lifecycle::{init_tracing, shutdown_signal};
use tankrelay_events::{
    transport, AlertConsumer, AlertLog, AlertSink, LogSink, WebhookDelivery, WebhookSink,
};
use tokio_util::sync::CancellationToken;

use crate::config::{SinkConfig, WorkerConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing("tankrelay_worker=debug,tankrelay_events=debug");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tankrelay-worker failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let config = WorkerConfig::from_env()?;
    tracing::info!(
        alerts_topic = %config.alerts_topic,
        sink = ?config.sink,
        "Loaded worker configuration"
    );

    let alert_log = Arc::new(AlertLog::new(config.alert_log_path.clone()));
    let sink: Arc<dyn AlertSink> = match &config.sink {
        SinkConfig::Log => Arc::new(LogSink::new(Arc::clone(&alert_log))),
        SinkConfig::Webhook { url, timeout } => {
            Arc::new(WebhookSink::new(WebhookDelivery::new(url.clone(), *timeout)?))
        }
    };

    let transport = transport::connect(&config.transport).await?;
    let subscription = transport.subscribe(&config.alerts_topic).await?;

    let cancel = CancellationToken::new();
    let consumer = AlertConsumer::new(sink, alert_log);
    let mut consumer_handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { consumer.run(subscription, cancel).await }
    });

    let joined = tokio::select! {
        () = shutdown_signal() => {
            cancel.cancel();
            consumer_handle.await
        }
        joined = &mut consumer_handle => joined,
    };
    if let Err(e) = joined {
        tracing::error!(error = %e, "Alert consumer task failed");
    }

    if let Err(e) = transport.close().await {
        tracing::warn!(error = %e, "Transport did not close cleanly");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
