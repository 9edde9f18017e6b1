use std::path::PathBuf;
use std::time::Duration;

use tankrelay_core::config::{env_or, env_parse};
use tankrelay_core::error::CoreError;
use tankrelay_core::topics::TOPIC_ALERTS;
use tankrelay_events::alert_log::DEFAULT_PATH;
use tankrelay_events::delivery::webhook::DEFAULT_TIMEOUT;
use tankrelay_events::TransportConfig;

/// Where consumed alerts end up.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkConfig {
    /// Tracing output plus the alert log file.
    Log,
    /// HTTP POST to an external endpoint.
    Webhook { url: String, timeout: Duration },
}

impl SinkConfig {
    /// Resolve the `ALERT_SINK` / `WEBHOOK_URL` pair.
    pub fn resolve(
        kind: &str,
        webhook_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "webhook" => match webhook_url.filter(|u| !u.trim().is_empty()) {
                Some(url) => Ok(Self::Webhook { url, timeout }),
                None => Err(CoreError::Config {
                    var: "WEBHOOK_URL",
                    message: "required when ALERT_SINK=webhook".into(),
                }),
            },
            other => Err(CoreError::Config {
                var: "ALERT_SINK",
                message: format!("unknown sink {other:?}, expected log or webhook"),
            }),
        }
    }
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub alerts_topic: String,
    /// Alert log file; also receives records of unparseable messages.
    pub alert_log_path: PathBuf,
    pub sink: SinkConfig,
    pub transport: TransportConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default          |
    /// |------------------------|------------------|
    /// | `ALERTS_TOPIC`         | `tanks.alerts`   |
    /// | `ALERT_LOG_PATH`       | `alerts.log`     |
    /// | `ALERT_SINK`           | `log`            |
    /// | `WEBHOOK_URL`          | (none)           |
    /// | `WEBHOOK_TIMEOUT_SECS` | `10`             |
    pub fn from_env() -> Result<Self, CoreError> {
        let timeout = Duration::from_secs(env_parse(
            "WEBHOOK_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
        )?);
        let sink = SinkConfig::resolve(
            &env_or("ALERT_SINK", "log"),
            std::env::var("WEBHOOK_URL").ok(),
            timeout,
        )?;

        Ok(Self {
            alerts_topic: env_or("ALERTS_TOPIC", TOPIC_ALERTS),
            alert_log_path: PathBuf::from(env_or("ALERT_LOG_PATH", DEFAULT_PATH)),
            sink,
            transport: TransportConfig::from_env("tankrelay-worker")?,
        })
    }
}
