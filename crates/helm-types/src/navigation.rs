//! Derived navigation data.
//!
//! [`NavigationData`] is never mutated field-by-field by callers; it is
//! recomputed wholesale from the active route and the active vessel.

use serde::{Deserialize, Serialize};

use crate::enums::BearingType;
use crate::position::Position;

/// A bearing value together with its reference north.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bearing {
    /// Bearing in radians, `[0, 2π)`.
    pub value: Option<f64>,
    /// Whether `value` is true or magnetic.
    pub kind: Option<BearingType>,
}

/// Displayable navigation state towards the current target point.
///
/// Distances are metres, speeds metres per second, times seconds and
/// angles radians.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationData {
    /// Velocity made good towards the target.
    pub vmg: Option<f64>,
    /// Distance to go.
    pub dtg: Option<f64>,
    /// Time to go.
    pub ttg: Option<f64>,
    /// Bearing to the target in the selected reference.
    pub bearing: Bearing,
    /// True bearing to the target.
    pub bearing_true: Option<f64>,
    /// Magnetic bearing to the target.
    pub bearing_magnetic: Option<f64>,
    /// Signed cross-track error, positive when right of the leg.
    pub xte: Option<f64>,
    /// The target position.
    pub position: Option<Position>,
    /// Index of the target within the active route, `None` when unset.
    pub point_index: Option<usize>,
    /// Number of points in the active route.
    pub point_total: usize,
}

impl NavigationData {
    /// A fully cleared record that keeps the given point index.
    pub fn cleared(point_index: Option<usize>) -> Self {
        Self {
            point_index,
            ..Self::default()
        }
    }

    /// Return `true` when every derived field is empty.
    pub fn is_cleared(&self) -> bool {
        self.vmg.is_none()
            && self.dtg.is_none()
            && self.ttg.is_none()
            && self.bearing == Bearing::default()
            && self.bearing_true.is_none()
            && self.bearing_magnetic.is_none()
            && self.xte.is_none()
            && self.position.is_none()
            && self.point_total == 0
    }

    /// The point index in the `-1 / 0..n` convention used by route controls.
    pub fn point_index_signed(&self) -> i64 {
        self.point_index
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1)
    }
}
