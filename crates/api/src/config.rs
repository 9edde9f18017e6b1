use std::path::PathBuf;

use axum::http::HeaderValue;
use tankrelay_core::config::{env_or, env_parse, split_list};
use tankrelay_core::error::CoreError;
use tankrelay_core::thresholds::LOW_LEVEL_THRESHOLD;
use tankrelay_core::topics::{TOPIC_ALERTS, TOPIC_RAW};
use tankrelay_events::alert_log::DEFAULT_PATH;
use tankrelay_events::TransportConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Fill level (percent) at or below which a tank raises an alert.
    pub low_level_threshold: f64,
    /// Topic receiving every snapshot verbatim.
    pub raw_topic: String,
    /// Topic receiving derived alerts.
    pub alerts_topic: String,
    /// Alert log file.
    pub alert_log_path: PathBuf,
    pub transport: TransportConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `LOW_LEVEL_THRESHOLD`  | `25`                       |
    /// | `RAW_TOPIC`            | `tanks.raw`                |
    /// | `ALERTS_TOPIC`         | `tanks.alerts`             |
    /// | `ALERT_LOG_PATH`       | `alerts.log`               |
    ///
    /// Transport settings are read by [`TransportConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        let cors_origins = split_list(&env_or("CORS_ORIGINS", "http://localhost:5173"))
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(&origin).map_err(|e| CoreError::Config {
                    var: "CORS_ORIGINS",
                    message: format!("invalid origin {origin:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let low_level_threshold: f64 = env_parse("LOW_LEVEL_THRESHOLD", LOW_LEVEL_THRESHOLD)?;
        if !(0.0..=100.0).contains(&low_level_threshold) {
            return Err(CoreError::Config {
                var: "LOW_LEVEL_THRESHOLD",
                message: format!("{low_level_threshold} is outside 0 to 100"),
            });
        }

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30)?,
            low_level_threshold,
            raw_topic: env_or("RAW_TOPIC", TOPIC_RAW),
            alerts_topic: env_or("ALERTS_TOPIC", TOPIC_ALERTS),
            alert_log_path: PathBuf::from(env_or("ALERT_LOG_PATH", DEFAULT_PATH)),
            transport: TransportConfig::from_env("tankrelay-api")?,
        })
    }
}
