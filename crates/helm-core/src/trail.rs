//! Bounded vessel trail.
//!
//! The trail keeps the most recent [`TRAIL_CAPACITY`] position samples of the
//! active vessel. A sample identical to the last one is not recorded again.

use std::collections::VecDeque;

use helm_types::{Position, SessionMode};
use serde::{Deserialize, Serialize};

/// Maximum number of samples kept in memory and persisted.
pub const TRAIL_CAPACITY: usize = 5000;

/// Storage key of a persisted trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailKey {
    /// The live own-ship trail.
    #[serde(rename = "self")]
    SelfTrail,
    /// The trail recorded while replaying history.
    History,
}

impl TrailKey {
    /// The key trail samples are persisted under in `mode`.
    pub const fn for_mode(mode: SessionMode) -> Self {
        match mode {
            SessionMode::Realtime => Self::SelfTrail,
            SessionMode::Playback => Self::History,
        }
    }

    /// The key as stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfTrail => "self",
            Self::History => "history",
        }
    }
}

impl core::fmt::Display for TrailKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, bounded sequence of position samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    samples: VecDeque<Position>,
}

impl Trail {
    /// An empty trail.
    pub const fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    /// Build a trail from stored samples, keeping only the newest
    /// [`TRAIL_CAPACITY`].
    pub fn from_samples(samples: impl IntoIterator<Item = Position>) -> Self {
        let mut trail = Self::new();
        trail.samples.extend(samples);
        trail.truncate();
        trail
    }

    /// Append a sample unless it equals the last one. Returns `true` when the
    /// sample was recorded.
    pub fn append(&mut self, sample: Position) -> bool {
        if self.samples.back() == Some(&sample) {
            return false;
        }
        self.samples.push_back(sample);
        self.truncate();
        true
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Return `true` when the trail holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The newest sample.
    pub fn last(&self) -> Option<Position> {
        self.samples.back().copied()
    }

    /// Copy the samples out, oldest first, for persistence.
    pub fn to_vec(&self) -> Vec<Position> {
        self.samples.iter().copied().collect()
    }

    fn truncate(&mut self) {
        while self.samples.len() > TRAIL_CAPACITY {
            self.samples.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_sample_is_recorded_once() {
        let mut trail = Trail::new();
        trail.append(Position::new(1.0, 1.0));
        let before = trail.len();
        let p = Position::new(2.0, 2.0);
        for _ in 0..10 {
            trail.append(p);
        }
        assert_eq!(trail.len(), before + 1);
    }

    #[test]
    fn non_adjacent_duplicates_are_kept() {
        let mut trail = Trail::new();
        assert!(trail.append(Position::new(1.0, 1.0)));
        assert!(trail.append(Position::new(2.0, 2.0)));
        assert!(trail.append(Position::new(1.0, 1.0)));
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut trail = Trail::new();
        for i in 0..(TRAIL_CAPACITY + 250) {
            let x = f64::from(u32::try_from(i).unwrap_or(u32::MAX));
            trail.append(Position::new(x, 0.0));
        }
        assert_eq!(trail.len(), TRAIL_CAPACITY);
        // Oldest samples were dropped first.
        assert_eq!(trail.to_vec().first(), Some(&Position::new(250.0, 0.0)));
    }

    #[test]
    fn from_samples_truncates() {
        let samples = (0..TRAIL_CAPACITY + 1).map(|_| Position::new(0.0, 0.0));
        assert_eq!(Trail::from_samples(samples).len(), TRAIL_CAPACITY);
    }

    #[test]
    fn key_follows_mode() {
        assert_eq!(TrailKey::for_mode(SessionMode::Realtime), TrailKey::SelfTrail);
        assert_eq!(TrailKey::for_mode(SessionMode::Playback), TrailKey::History);
        assert_eq!(TrailKey::SelfTrail.to_string(), "self");
    }
}
