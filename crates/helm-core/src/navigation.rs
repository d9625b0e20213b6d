//! Navigation aggregator.
//!
//! Derives bearing, distance/time to go, velocity made good and cross-track
//! error towards the current target point. The target is the explicit
//! next-point override when one is set, otherwise the active route's
//! coordinate at the current point index.
//!
//! The point index is route-scoped state and survives [`clear`]; the derived
//! numbers do not.
//!
//! [`clear`]: NavigationAggregator::clear

use std::f64::consts::TAU;

use helm_types::{
    Bearing, BearingType, Direction, HeadingAttribute, NavigationData, Position, Vessel,
};
use tracing::trace;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Holds the point index and next-point override, and the navigation data
/// last derived from them.
#[derive(Debug, Clone, Default)]
pub struct NavigationAggregator {
    next_point: Option<Position>,
    point_index: Option<usize>,
    data: NavigationData,
}

impl NavigationAggregator {
    /// An aggregator with no target.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last derived navigation data.
    pub const fn data(&self) -> &NavigationData {
        &self.data
    }

    /// Current point index, `None` when unset.
    pub const fn point_index(&self) -> Option<usize> {
        self.point_index
    }

    /// The explicit next-point override.
    pub const fn next_point(&self) -> Option<Position> {
        self.next_point
    }

    /// Set an explicit target. `None` falls back to route progression.
    pub fn set_next_point(&mut self, point: Option<Position>) {
        self.next_point = point;
    }

    /// Step the point index along `coords` and return the new target.
    ///
    /// From the unset state `Previous` seeds the first point and `Next` the
    /// last. Stepping past either end is a no-op and returns `None`, as does
    /// an empty route. An index left over from a longer route is clamped to
    /// the last point first.
    pub fn advance_point(&mut self, direction: Direction, coords: &[Position]) -> Option<Position> {
        let last = coords.len().checked_sub(1)?;
        let next = match (self.point_index.map(|i| i.min(last)), direction) {
            (None, Direction::Previous) => 0,
            (None, Direction::Next) => last,
            (Some(i), Direction::Previous) => i.checked_sub(1)?,
            (Some(i), Direction::Next) => {
                if i >= last {
                    return None;
                }
                i.saturating_add(1)
            }
        };
        trace!(from = ?self.point_index, to = next, "advance point");
        self.point_index = Some(next);
        coords.get(next).copied()
    }

    /// Recompute the navigation data for `route` and `vessel`.
    ///
    /// An empty route, or no target point, yields cleared data.
    pub fn recompute(
        &mut self,
        route: &[Position],
        vessel: &Vessel,
        attribute: HeadingAttribute,
    ) -> &NavigationData {
        if let Some(last) = route.len().checked_sub(1) {
            self.point_index = self.point_index.map(|i| i.min(last));
        }

        let from_route = self.point_index.and_then(|i| route.get(i).copied());
        let target = if route.is_empty() {
            None
        } else {
            self.next_point.or(from_route)
        };

        let Some(target) = target else {
            self.clear();
            return &self.data;
        };

        let previous = self
            .point_index
            .filter(|_| from_route == Some(target))
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| route.get(i).copied());

        let mut data = compute_navigation(target, previous, vessel, attribute);
        data.point_index = self.point_index;
        data.point_total = route.len();
        self.data = data;
        &self.data
    }

    /// Reset every derived field, keeping the point index.
    pub fn clear(&mut self) {
        self.data = NavigationData::cleared(self.point_index);
    }
}

/// Derive navigation data towards `target` for `vessel`.
///
/// `previous` is the start of the current leg; cross-track error is only
/// computed when it is known. Point index and total are left unset.
pub fn compute_navigation(
    target: Position,
    previous: Option<Position>,
    vessel: &Vessel,
    attribute: HeadingAttribute,
) -> NavigationData {
    let here = vessel.position;
    let bearing_true = initial_bearing(here, target);
    let bearing_magnetic = vessel
        .magnetic_variation
        .map(|var| normalize(bearing_true - var));
    let dtg = distance(here, target);
    let xte = previous.map(|start| cross_track(start, target, here));

    let cog = vessel.cog_true.or(vessel.cog);
    let vmg = match (vessel.sog, cog) {
        (Some(sog), Some(cog)) => Some(sog * (bearing_true - cog).cos()),
        _ => None,
    };
    let ttg = vmg.filter(|v| *v > 0.0).map(|v| dtg / v);

    let bearing = match (attribute, bearing_magnetic) {
        (HeadingAttribute::Magnetic, Some(value)) => Bearing {
            value: Some(value),
            kind: Some(BearingType::Magnetic),
        },
        _ => Bearing {
            value: Some(bearing_true),
            kind: Some(BearingType::True),
        },
    };

    NavigationData {
        vmg,
        dtg: Some(dtg),
        ttg,
        bearing,
        bearing_true: Some(bearing_true),
        bearing_magnetic,
        xte,
        position: Some(target),
        point_index: None,
        point_total: 0,
    }
}

// ---------------------------------------------------------------------------
// Spherical geometry
// ---------------------------------------------------------------------------

/// Great-circle distance in metres (haversine).
pub fn distance(from: Position, to: Position) -> f64 {
    EARTH_RADIUS_M * angular_distance(from, to)
}

/// Initial great-circle bearing in radians, `[0, 2π)`.
pub fn initial_bearing(from: Position, to: Position) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos().mul_add(phi2.sin(), -(phi1.sin() * phi2.cos() * d_lambda.cos()));
    normalize(y.atan2(x))
}

/// Signed cross-track distance in metres of `point` from the great circle
/// `start` -> `end`. Positive when `point` lies to the right of the track.
pub fn cross_track(start: Position, end: Position, point: Position) -> f64 {
    let d13 = angular_distance(start, point);
    let theta13 = initial_bearing(start, point);
    let theta12 = initial_bearing(start, end);
    (d13.sin() * (theta13 - theta12).sin()).asin() * EARTH_RADIUS_M
}

fn angular_distance(from: Position, to: Position) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (phi1.cos() * phi2.cos()).mul_add(
        (d_lambda / 2.0).sin().powi(2),
        (d_phi / 2.0).sin().powi(2),
    );
    2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt())
}

fn normalize(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if a >= TAU { 0.0 } else { a }
}
