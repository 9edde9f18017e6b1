//! Request handlers. Routes live in [`crate::routes`].

pub mod telemetry;
