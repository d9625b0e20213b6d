//! Vessel data model.
//!
//! A [`Vessel`] is either the own ship ("self") or an AIS target. Angles are
//! radians and speeds metres per second, as delivered by the telemetry feed.
//! The `heading`, `cog` and `wind.direction` fields are the *selected*
//! variants; [`Vessel::apply_heading_attribute`] re-derives them from the
//! true/magnetic pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::HeadingAttribute;
use crate::ids::VesselId;
use crate::position::Position;

/// Wind observations attached to a vessel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Selected wind direction (true or magnetic per the heading attribute).
    pub direction: Option<f64>,
    /// True wind direction.
    pub twd: Option<f64>,
    /// Magnetic wind direction.
    pub mwd: Option<f64>,
    /// Apparent wind angle relative to the bow.
    pub awa: Option<f64>,
    /// Apparent wind speed.
    pub aws: Option<f64>,
}

/// A vessel observed on the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    /// Context identifier. The own ship uses [`Vessel::SELF_CONTEXT`].
    pub id: VesselId,
    /// Vessel name, when reported.
    pub name: Option<String>,
    /// MMSI, when reported.
    pub mmsi: Option<String>,
    /// Last reported position.
    pub position: Position,
    /// Selected heading.
    pub heading: Option<f64>,
    /// True heading.
    pub heading_true: Option<f64>,
    /// Magnetic heading.
    pub heading_magnetic: Option<f64>,
    /// Selected course over ground.
    pub cog: Option<f64>,
    /// True course over ground.
    pub cog_true: Option<f64>,
    /// Magnetic course over ground.
    pub cog_magnetic: Option<f64>,
    /// Speed over ground.
    pub sog: Option<f64>,
    /// Magnetic variation, east positive.
    pub magnetic_variation: Option<f64>,
    /// Wind observations.
    pub wind: Wind,
    /// Local receipt time of the last update for this vessel.
    pub last_update: Option<DateTime<Utc>>,
}

impl Vessel {
    /// Context string the server uses for the own ship.
    pub const SELF_CONTEXT: &'static str = "vessels.self";

    /// Create a vessel with no observations.
    pub fn new(id: VesselId) -> Self {
        Self {
            id,
            name: None,
            mmsi: None,
            position: Position::default(),
            heading: None,
            heading_true: None,
            heading_magnetic: None,
            cog: None,
            cog_true: None,
            cog_magnetic: None,
            sog: None,
            magnetic_variation: None,
            wind: Wind::default(),
            last_update: None,
        }
    }

    /// Create the own-ship record.
    pub fn own_ship() -> Self {
        Self::new(VesselId::new(Self::SELF_CONTEXT))
    }

    /// Re-derive the selected heading, course and wind direction.
    pub fn apply_heading_attribute(&mut self, attribute: HeadingAttribute) {
        if attribute.is_magnetic() {
            self.heading = self.heading_magnetic;
            self.cog = self.cog_magnetic;
            self.wind.direction = self.wind.mwd;
        } else {
            self.heading = self.heading_true;
            self.cog = self.cog_true;
            self.wind.direction = self.wind.twd;
        }
    }
}
