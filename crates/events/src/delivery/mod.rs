//! External delivery channels for alerts.
//!
//! - [`webhook`]: HTTP POST delivery, single attempt.

pub mod webhook;
