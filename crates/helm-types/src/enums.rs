//! Enumeration types shared across the session core.

use serde::{Deserialize, Serialize};

/// The feed the session is observing.
///
/// Exactly one mode is current. Changing mode always goes through a full
/// close and reopen of the stream connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Live telemetry from the server.
    #[default]
    Realtime,
    /// Replay of historical telemetry.
    Playback,
}

impl SessionMode {
    /// Return `true` for [`SessionMode::Playback`].
    pub const fn is_playback(self) -> bool {
        matches!(self, Self::Playback)
    }
}

impl core::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Realtime => f.write_str("realtime"),
            Self::Playback => f.write_str("playback"),
        }
    }
}

/// Reference north of a bearing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BearingType {
    /// Referenced to true north.
    True,
    /// Referenced to magnetic north.
    Magnetic,
}

/// Which heading, course and wind variants the user wants displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingAttribute {
    /// Show true heading, true COG and true wind direction.
    #[default]
    True,
    /// Show magnetic heading, magnetic COG and magnetic wind direction.
    Magnetic,
}

impl HeadingAttribute {
    /// Return `true` for [`HeadingAttribute::Magnetic`].
    pub const fn is_magnetic(self) -> bool {
        matches!(self, Self::Magnetic)
    }

    /// The bearing type that matches this attribute.
    pub const fn bearing_type(self) -> BearingType {
        match self {
            Self::True => BearingType::True,
            Self::Magnetic => BearingType::Magnetic,
        }
    }
}

/// Direction for stepping through the points of the active route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards the first point (-1).
    Previous,
    /// Towards the last point (+1).
    Next,
}

impl Direction {
    /// Map the `-1 / +1` convention onto a direction. Any negative value is
    /// [`Direction::Previous`], anything else is [`Direction::Next`].
    pub const fn from_step(step: i32) -> Self {
        if step < 0 { Self::Previous } else { Self::Next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&SessionMode::Playback).unwrap_or_default();
        assert_eq!(json, "\"playback\"");
        assert!(SessionMode::Playback.is_playback());
        assert!(!SessionMode::default().is_playback());
    }

    #[test]
    fn direction_from_step() {
        assert_eq!(Direction::from_step(-1), Direction::Previous);
        assert_eq!(Direction::from_step(1), Direction::Next);
    }

    #[test]
    fn heading_attribute_selects_bearing_type() {
        assert_eq!(HeadingAttribute::Magnetic.bearing_type(), BearingType::Magnetic);
        assert_eq!(HeadingAttribute::True.bearing_type(), BearingType::True);
    }
}
