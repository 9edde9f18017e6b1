//! Low-level alert payload published on the alerts topic (and consumed by the
//! alert worker).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::telemetry::PayloadError;
use crate::types::Timestamp;

/// Kind of alert event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// One or more tanks at or below the low-level threshold.
    LowLevel,
}

/// A single tank that crossed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankAlert {
    pub id: String,
    pub name: String,
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Threshold the level was compared against.
    pub threshold: f64,
    /// `threshold - level`, rounded to 2 decimal places.
    pub deficit: f64,
}

/// Per-location summary. Only locations with at least one qualifying tank
/// appear in an [`Alert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAlert {
    pub location_id: String,
    /// Number of evaluated tanks in the location, qualifying or not.
    pub total_tanks: usize,
    /// Number of tanks at or below the threshold.
    pub low_level_tanks: usize,
    pub tanks: Vec<TankAlert>,
}

/// A derived alert. Constructed by the threshold evaluator and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub timestamp: Timestamp,
    pub threshold: f64,
    pub locations: Vec<LocationAlert>,
}

impl Alert {
    /// Parse an alert received from the transport.
    pub fn parse(bytes: &[u8]) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(PayloadError::Malformed)?;
        serde_json::from_value(value).map_err(PayloadError::Shape)
    }

    /// Encode for publishing.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, CoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Total qualifying tanks across all locations.
    pub fn tank_count(&self) -> usize {
        self.locations.iter().map(|l| l.low_level_tanks).sum()
    }
}
