//! NATS-backed transport.
//!
//! One long-lived connection per process. The client reconnects on its own at
//! a fixed interval after transient network loss; connection state changes are
//! only logged.

use std::time::Duration;

use async_nats::connection::State;
use async_nats::{Client, ConnectOptions, Event};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::RwLock;

use super::{Subscription, Transport, TransportConfig, TransportError, TransportMessage};

/// NATS client wrapper implementing [`Transport`].
pub struct NatsTransport {
    client: RwLock<Option<Client>>,
}

impl NatsTransport {
    /// Open the connection described by `config`.
    ///
    /// The first connect is retried in the background, so a broker that is
    /// down at startup does not keep the process from coming up; publishes
    /// issued meanwhile are buffered by the client.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let reconnect_interval = config.reconnect_interval;

        let client = ConnectOptions::new()
            .name(&config.client_name)
            .connection_timeout(config.connect_timeout)
            .retry_on_initial_connect()
            .reconnect_delay_callback(move |_attempts| reconnect_interval)
            .event_callback(|event| async move {
                match event {
                    Event::Connected => tracing::info!("Transport connected"),
                    Event::Disconnected => {
                        tracing::warn!("Transport disconnected, reconnecting")
                    }
                    other => tracing::warn!(event = %other, "Transport event"),
                }
            })
            .connect(config.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::info!(
            url = %config.url,
            reconnect_secs = reconnect_interval.as_secs(),
            "Transport client created"
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
        })
    }

    async fn client(&self) -> Result<Client, TransportError> {
        self.client.read().await.clone().ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let client = self.client().await?;
        client
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        let client = self.client().await?;
        let subscriber = client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;

        let stream = subscriber.map(|message| TransportMessage {
            topic: message.subject.to_string(),
            payload: message.payload.to_vec(),
        });
        Ok(stream.boxed())
    }

    fn is_connected(&self) -> bool {
        match self.client.try_read() {
            Ok(guard) => guard
                .as_ref()
                .is_some_and(|c| matches!(c.connection_state(), State::Connected)),
            // A writer holds the lock only while closing.
            Err(_) => false,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        let Some(client) = self.client.write().await.take() else {
            return Ok(());
        };

        let flushed = tokio::time::timeout(Duration::from_secs(5), client.flush()).await;
        drop(client);

        match flushed {
            Ok(Ok(())) => {
                tracing::info!("Transport connection closed");
                Ok(())
            }
            Ok(Err(e)) => Err(TransportError::Flush(e.to_string())),
            Err(_) => Err(TransportError::Flush("timed out".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// A transport whose client has already been taken by `close`.
    fn closed_transport() -> NatsTransport {
        NatsTransport {
            client: RwLock::new(None),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let transport = closed_transport();

        assert_matches!(transport.close().await, Ok(()));
        assert_matches!(transport.close().await, Ok(()));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn publish_after_close_is_rejected() {
        let transport = closed_transport();
        transport.close().await.unwrap();

        assert_matches!(
            transport.publish("tanks.raw", b"{}".to_vec()).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn subscribe_after_close_is_rejected() {
        let transport = closed_transport();

        let result = transport.subscribe("tanks.alerts").await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }
}
