//! Publish/subscribe transport seam.
//!
//! Handlers and the alert consumer only see [`Transport`], so the NATS client
//! used in production and the in-process [`memory::MemoryTransport`] used in
//! tests and local runs are interchangeable. Clients are constructed
//! explicitly and closed explicitly; there is no global connection.

pub mod memory;
pub mod nats;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tankrelay_core::config::{env_or, env_parse};
use tankrelay_core::error::CoreError;

/// Default broker URL.
pub const DEFAULT_URL: &str = "nats://localhost:4222";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },

    #[error("subscribe to {topic} failed: {message}")]
    Subscribe { topic: String, message: String },

    #[error("flush failed: {0}")]
    Flush(String),

    #[error("transport is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Message / trait
// ---------------------------------------------------------------------------

/// A message received on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Stream of messages for one topic.
pub type Subscription = BoxStream<'static, TransportMessage>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `payload` on `topic`. At-most-once, no retry.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Subscribe to `topic`. Messages published before this call are not
    /// delivered.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError>;

    /// Whether the underlying connection is currently up.
    fn is_connected(&self) -> bool;

    /// Flush pending messages and release the connection. Further publishes
    /// fail with [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Which [`Transport`] implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Nats,
    Memory,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nats" => Ok(Self::Nats),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown transport {other:?}, expected nats or memory")),
        }
    }
}

/// Connection settings for the broker client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Transport implementation (default: `nats`).
    pub kind: TransportKind,
    /// Broker URL (default: `nats://localhost:4222`).
    pub url: String,
    /// Name reported to the broker for this connection.
    pub client_name: String,
    /// Timeout for a single connect attempt (default: 10 s).
    pub connect_timeout: Duration,
    /// Fixed delay between reconnect attempts (default: 5 s).
    pub reconnect_interval: Duration,
}

impl TransportConfig {
    /// Load from environment variables with defaults.
    ///
    /// | Env Var                          | Default                  |
    /// |----------------------------------|--------------------------|
    /// | `TRANSPORT`                      | `nats`                   |
    /// | `NATS_URL`                       | `nats://localhost:4222`  |
    /// | `TRANSPORT_CONNECT_TIMEOUT_SECS` | `10`                     |
    /// | `TRANSPORT_RECONNECT_SECS`       | `5`                      |
    pub fn from_env(client_name: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            kind: env_parse("TRANSPORT", TransportKind::Nats)?,
            url: env_or("NATS_URL", DEFAULT_URL),
            client_name: client_name.into(),
            connect_timeout: Duration::from_secs(env_parse(
                "TRANSPORT_CONNECT_TIMEOUT_SECS",
                10,
            )?),
            reconnect_interval: Duration::from_secs(env_parse("TRANSPORT_RECONNECT_SECS", 5)?),
        })
    }
}

/// Construct the transport selected by `config.kind`.
pub async fn connect(config: &TransportConfig) -> Result<Arc<dyn Transport>, TransportError> {
    match config.kind {
        TransportKind::Nats => Ok(Arc::new(nats::NatsTransport::connect(config).await?)),
        TransportKind::Memory => {
            tracing::warn!("Using the in-process transport, nothing leaves this process");
            Ok(Arc::new(memory::MemoryTransport::default()))
        }
    }
}
