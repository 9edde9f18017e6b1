//! Append-only alert log.
//!
//! One record per line: `[<RFC 3339 UTC timestamp>] <json>`. Alerts are written
//! as their wire JSON; error events as `{"type":"error",...}`. No rotation.
//!
//! Each append opens the file, writes the full line, flushes and closes it
//! again while holding an async mutex, so lines never interleave and every
//! failure comes back to the caller.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tankrelay_core::alert::Alert;
use tankrelay_core::types::Timestamp;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Default log file path, relative to the working directory.
pub const DEFAULT_PATH: &str = "alerts.log";

#[derive(Debug, thiserror::Error)]
pub enum AlertLogError {
    #[error("cannot write alert log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode alert log record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Error event recorded next to alerts.
#[derive(Debug, Serialize)]
struct ErrorRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a str>,
}

/// Writer for the alert log file.
pub struct AlertLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an alert record.
    pub async fn append_alert(&self, alert: &Alert) -> Result<(), AlertLogError> {
        self.append(alert).await
    }

    /// Append an error event, optionally carrying the offending raw payload.
    pub async fn append_error(
        &self,
        message: &str,
        payload: Option<&str>,
    ) -> Result<(), AlertLogError> {
        self.append(&ErrorRecord {
            kind: "error",
            message,
            payload,
        })
        .await
    }

    async fn append<T: Serialize>(&self, record: &T) -> Result<(), AlertLogError> {
        let _guard = self.lock.lock().await;
        // Stamped under the lock so line prefixes stay in file order.
        let line = format_line(Utc::now(), record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;
        file.flush().await.map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> AlertLogError {
        AlertLogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Render one log line, newline included.
pub fn format_line<T: Serialize>(at: Timestamp, record: &T) -> Result<String, AlertLogError> {
    let json = serde_json::to_string(record)?;
    Ok(format!(
        "[{}] {json}\n",
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use tankrelay_core::thresholds::evaluate;
    use tankrelay_core::telemetry::{Location, Reading};

    use super::*;

    fn sample_alert() -> Alert {
        let location = Location {
            id: "north".into(),
            readings: vec![Reading {
                id: "t1".into(),
                name: "Diesel".into(),
                level: 10.0,
                last_updated: None,
            }],
        };
        evaluate(&[location], 25.0, Utc::now()).expect("level 10 is below 25")
    }

    #[test]
    fn line_has_timestamp_prefix_and_json_body() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let line = format_line(at, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(line, "[2024-05-01T12:00:00.000Z] {\"a\":1}\n");
    }

    #[tokio::test]
    async fn appends_alert_and_error_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = AlertLog::new(dir.path().join("alerts.log"));

        log.append_alert(&sample_alert()).await.unwrap();
        log.append_error("unparseable alert", Some("{oops")).await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            assert!(line.starts_with('['), "missing timestamp prefix: {line}");
        }

        let (_, alert_json) = lines[0].split_once("] ").unwrap();
        let alert = Alert::parse(alert_json.as_bytes()).unwrap();
        assert_eq!(alert.locations[0].tanks[0].deficit, 15.0);

        let (_, error_json) = lines[1].split_once("] ").unwrap();
        let error: serde_json::Value = serde_json::from_str(error_json).unwrap();
        assert_eq!(error["type"], "error");
        assert_eq!(error["payload"], "{oops");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_timestamps_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(AlertLog::new(dir.path().join("alerts.log")));

        let writers: Vec<_> = (0..32)
            .map(|i| {
                let log = Arc::clone(&log);
                tokio::spawn(async move { log.append_error(&format!("event {i}"), None).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let stamps: Vec<_> = contents
            .lines()
            .map(|line| {
                let (prefix, _) = line.split_once("] ").unwrap();
                chrono::DateTime::parse_from_rfc3339(&prefix[1..]).unwrap()
            })
            .collect();
        assert_eq!(stamps.len(), 32);
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = AlertLog::new(dir.path().join("missing-dir").join("alerts.log"));

        assert_matches!(
            log.append_error("boom", None).await,
            Err(AlertLogError::Io { .. })
        );
    }
}
