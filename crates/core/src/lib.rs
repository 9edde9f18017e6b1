//! Tank relay domain types and alerting logic.
//!
//! Pure logic only. Nothing in this crate touches the network or the disk; the API server and
//! the alert worker own the transport, the log file and the webhook client.

pub mod alert;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod thresholds;
pub mod topics;
pub mod types;
