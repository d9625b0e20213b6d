//! Geographic positions.
//!
//! Positions travel as `[longitude, latitude]` pairs in decimal degrees, the
//! same order the resource store uses for route coordinates.

use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
///
/// Serialized as a `[lon, lat]` array. Equality is exact, which is what the
/// trail de-duplication rule relies on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Latitude in degrees, north positive.
    pub latitude: f64,
}

impl Position {
    /// Create a position from longitude and latitude in degrees.
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Return `true` when both coordinates are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl From<[f64; 2]> for Position {
    fn from(lon_lat: [f64; 2]) -> Self {
        let [longitude, latitude] = lon_lat;
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        [p.longitude, p.latitude]
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.longitude, self.latitude)
    }
}
