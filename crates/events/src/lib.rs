//! Tank relay messaging infrastructure.
//!
//! - [`transport`]: the pub/sub seam: the [`Transport`] trait, a NATS-backed
//!   client and an in-process broadcast implementation.
//! - [`AlertLog`]: append-only alert log file.
//! - [`delivery`]: external delivery channels (webhook).
//! - [`AlertConsumer`]: subscribes to the alerts topic and hands each alert
//!   to an [`AlertSink`].
//! - [`lifecycle`]: tracing setup and termination signals for the binaries.

pub mod alert_log;
pub mod consumer;
pub mod delivery;
pub mod lifecycle;
pub mod transport;

pub use alert_log::{AlertLog, AlertLogError};
pub use consumer::{
    AlertConsumer, AlertSink, ConsumerStats, LogSink, MessageOutcome, SinkError, WebhookSink,
};
pub use delivery::webhook::{WebhookDelivery, WebhookError};
pub use transport::memory::MemoryTransport;
pub use transport::nats::NatsTransport;
pub use transport::{
    Subscription, Transport, TransportConfig, TransportError, TransportKind, TransportMessage,
};
