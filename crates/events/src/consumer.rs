//! Alert consumer.
//!
//! [`AlertConsumer`] drains an alerts-topic [`Subscription`], parses every
//! message as an [`Alert`] and hands it to an [`AlertSink`]. Nothing here is
//! fatal: unparseable messages are logged with their raw payload and skipped,
//! sink failures are logged and dropped. Both leave an error record in the
//! alert log.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tankrelay_core::alert::Alert;
use tokio_util::sync::CancellationToken;

use crate::alert_log::{AlertLog, AlertLogError};
use crate::delivery::webhook::{WebhookDelivery, WebhookError};
use crate::transport::{Subscription, TransportMessage};

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error(transparent)]
    Log(#[from] AlertLogError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

/// Final destination of a parsed alert.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    async fn handle(&self, alert: &Alert) -> Result<(), SinkError>;
}

/// Writes alerts to the tracing output and the alert log file.
pub struct LogSink {
    log: Arc<AlertLog>,
}

impl LogSink {
    pub fn new(log: Arc<AlertLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn handle(&self, alert: &Alert) -> Result<(), SinkError> {
        tracing::warn!(
            timestamp = %alert.timestamp,
            threshold = alert.threshold,
            locations = alert.locations.len(),
            tanks = alert.tank_count(),
            "Low-level alert received"
        );
        for location in &alert.locations {
            for tank in &location.tanks {
                tracing::warn!(
                    location = %location.location_id,
                    tank = %tank.id,
                    name = %tank.name,
                    level = tank.level,
                    deficit = tank.deficit,
                    "Tank below threshold"
                );
            }
        }

        self.log.append_alert(alert).await?;
        Ok(())
    }
}

/// Forwards alerts to an external webhook.
pub struct WebhookSink {
    delivery: WebhookDelivery,
}

impl WebhookSink {
    pub fn new(delivery: WebhookDelivery) -> Self {
        Self { delivery }
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn handle(&self, alert: &Alert) -> Result<(), SinkError> {
        self.delivery.deliver(alert).await?;
        tracing::info!(
            url = %self.delivery.url(),
            tanks = alert.tank_count(),
            "Alert forwarded to webhook"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// What happened to a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Delivered,
    Malformed,
    SinkFailed,
}

/// Message counters reported when the consumer stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub delivered: u64,
    pub malformed: u64,
    pub sink_failures: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: MessageOutcome) {
        self.received += 1;
        match outcome {
            MessageOutcome::Delivered => self.delivered += 1,
            MessageOutcome::Malformed => self.malformed += 1,
            MessageOutcome::SinkFailed => self.sink_failures += 1,
        }
    }
}

pub struct AlertConsumer {
    sink: Arc<dyn AlertSink>,
    /// Receives error events for unparseable messages and failed deliveries.
    log: Arc<AlertLog>,
}

impl AlertConsumer {
    pub fn new(sink: Arc<dyn AlertSink>, log: Arc<AlertLog>) -> Self {
        Self { sink, log }
    }

    /// Process messages until the subscription ends or `cancel` fires.
    pub async fn run(
        &self,
        mut subscription: Subscription,
        cancel: CancellationToken,
    ) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        tracing::info!(sink = self.sink.name(), "Alert consumer started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Alert consumer cancelled");
                    break;
                }
                next = subscription.next() => match next {
                    Some(message) => stats.record(self.handle_message(&message).await),
                    None => {
                        tracing::info!("Alert subscription closed, consumer shutting down");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            received = stats.received,
            delivered = stats.delivered,
            malformed = stats.malformed,
            sink_failures = stats.sink_failures,
            "Alert consumer stopped"
        );
        stats
    }

    /// Parse and dispatch one message.
    pub async fn handle_message(&self, message: &TransportMessage) -> MessageOutcome {
        let alert = match Alert::parse(&message.payload) {
            Ok(alert) => alert,
            Err(e) => {
                let raw = String::from_utf8_lossy(&message.payload);
                tracing::warn!(
                    topic = %message.topic,
                    error = %e,
                    payload = %raw,
                    "Dropping unparseable alert message"
                );
                if let Err(log_err) = self.log.append_error(&e.to_string(), Some(&raw)).await {
                    tracing::error!(error = %log_err, "Failed to record parse error in alert log");
                }
                return MessageOutcome::Malformed;
            }
        };

        match self.sink.handle(&alert).await {
            Ok(()) => MessageOutcome::Delivered,
            Err(e) => {
                tracing::error!(
                    sink = self.sink.name(),
                    error = %e,
                    "Alert delivery failed, dropping alert"
                );
                let note = format!("{} sink failed: {e}", self.sink.name());
                if let Err(log_err) = self.log.append_error(&note, None).await {
                    tracing::error!(error = %log_err, "Failed to record delivery error in alert log");
                }
                MessageOutcome::SinkFailed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
