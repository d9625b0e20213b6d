//! Server-facing value types: discovery info, playback queries, credentials.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity of the telemetry server, taken from its discovery document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server implementation id, e.g. `signalk-server-node`.
    pub id: Option<String>,
    /// Server API version.
    pub version: Option<String>,
}

impl ServerInfo {
    /// Extract server info from a discovery document.
    ///
    /// Looks for `server.id`, `server.version` and falls back to
    /// `endpoints.v1.version` for the version.
    pub fn from_discovery(doc: &serde_json::Value) -> Self {
        let id = doc
            .pointer("/server/id")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);
        let version = doc
            .pointer("/server/version")
            .or_else(|| doc.pointer("/endpoints/v1/version"))
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);
        Self { id, version }
    }
}

/// Query parameters selecting a historical time window for playback.
///
/// Kept as an ordered map so the parameters are passed through to the
/// playback endpoint verbatim and in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackQuery(pub BTreeMap<String, String>);

impl PlaybackQuery {
    /// Create an empty query.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Username and password collected by the login modal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
