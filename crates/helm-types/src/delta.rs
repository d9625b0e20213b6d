//! Decoded telemetry messages.
//!
//! The stream session turns raw frames into [`Delta`] values. A `hello` opens
//! every connection; `update` messages carry timestamped path/value pairs for
//! one vessel context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded telemetry message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Delta {
    /// Connection handshake.
    Hello(Hello),
    /// Timestamped state delta for one context.
    Update(Update),
}

/// The handshake message sent by the server on every new connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Context of the own ship, e.g. `vessels.urn:mrn:imo:mmsi:123456789`.
    #[serde(rename = "self")]
    pub self_id: Option<String>,
    /// `true` when the connection replays historical data.
    pub playback: bool,
    /// Server version string, when reported.
    pub version: Option<String>,
    /// Server timestamp (playback start time for replays).
    pub timestamp: Option<DateTime<Utc>>,
}

/// A single path/value observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    /// Dotted data path, e.g. `navigation.position`.
    pub path: String,
    /// Raw JSON value as delivered by the server.
    pub value: serde_json::Value,
}

/// A timestamped set of observations for one vessel context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Vessel context the values belong to.
    pub context: String,
    /// Source timestamp of the observations.
    pub timestamp: Option<DateTime<Utc>>,
    /// The observed values.
    pub values: Vec<PathValue>,
}
