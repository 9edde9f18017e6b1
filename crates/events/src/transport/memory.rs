//! In-process transport backed by a `tokio::sync::broadcast` channel.
//!
//! Every subscriber gets its own receiver and filters the shared stream by
//! topic. Used by the integration tests and for running the API server
//! without a broker (`TRANSPORT=memory`).

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use super::{Subscription, Transport, TransportError, TransportMessage};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out transport living entirely inside the current process.
///
/// When the buffer is full the oldest messages are dropped and lagging
/// subscribers skip ahead, which matches the at-most-once contract of the
/// real broker.
pub struct MemoryTransport {
    sender: broadcast::Sender<TransportMessage>,
    closed: AtomicBool,
}

impl MemoryTransport {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        // A send error only means there are no subscribers.
        let _ = self.sender.send(TransportMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let topic = topic.to_string();
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| {
            let wanted = match item {
                Ok(message) if message.topic == topic => Some(message),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, topic = %topic, "Memory transport subscriber lagged");
                    None
                }
            };
            std::future::ready(wanted)
        });
        Ok(stream.boxed())
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
