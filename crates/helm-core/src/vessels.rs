//! Vessel registry.
//!
//! Holds the own ship, every AIS target seen on the feed, and which of them
//! is active. The own ship always exists and is the fallback whenever the
//! requested active vessel is unknown or disappears.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use helm_types::{HeadingAttribute, PathValue, Position, Update, Vessel, VesselId};
use tracing::{debug, trace};

/// Own ship plus AIS targets, with one active selection.
#[derive(Debug, Clone)]
pub struct VesselRegistry {
    own: Vessel,
    self_context: Option<String>,
    targets: BTreeMap<VesselId, Vessel>,
    active_id: Option<VesselId>,
}

impl Default for VesselRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VesselRegistry {
    /// A registry holding only the own ship, which is active.
    pub fn new() -> Self {
        Self {
            own: Vessel::own_ship(),
            self_context: None,
            targets: BTreeMap::new(),
            active_id: None,
        }
    }

    /// The own ship.
    pub const fn own_ship(&self) -> &Vessel {
        &self.own
    }

    /// An AIS target by id.
    pub fn target(&self, id: &VesselId) -> Option<&Vessel> {
        self.targets.get(id)
    }

    /// Number of AIS targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Id of the active AIS target, `None` when the own ship is active.
    pub const fn active_id(&self) -> Option<&VesselId> {
        self.active_id.as_ref()
    }

    /// The active vessel.
    pub fn active(&self) -> &Vessel {
        self.active_id
            .as_ref()
            .and_then(|id| self.targets.get(id))
            .unwrap_or(&self.own)
    }

    /// Record the own-ship context announced in the handshake.
    pub fn set_self_context(&mut self, context: Option<&str>) {
        self.self_context = context.map(ToOwned::to_owned);
    }

    /// Make `id` active. Unknown ids (and `None`) select the own ship.
    ///
    /// Returns `true` when the requested target was found.
    pub fn select(&mut self, id: Option<&VesselId>) -> bool {
        match id {
            Some(id) if self.targets.contains_key(id) => {
                self.active_id = Some(id.clone());
                true
            }
            Some(id) => {
                debug!(vessel = %id, "unknown vessel, falling back to self");
                self.active_id = None;
                false
            }
            None => {
                self.active_id = None;
                false
            }
        }
    }

    /// Set name and MMSI of the own ship from an identity document.
    pub fn apply_identity(&mut self, doc: &serde_json::Value) {
        self.own.name = string_field(doc, "name");
        self.own.mmsi = string_field(doc, "mmsi");
    }

    /// Apply a telemetry update to the vessel it addresses, creating AIS
    /// targets on first sight.
    ///
    /// Returns `true` when the update touched the active vessel.
    pub fn apply_update(
        &mut self,
        update: &Update,
        received_at: DateTime<Utc>,
        attribute: HeadingAttribute,
    ) -> bool {
        let is_self = self.is_self_context(&update.context);
        let vessel = if is_self {
            &mut self.own
        } else {
            let id = VesselId::new(update.context.as_str());
            self.targets
                .entry(id.clone())
                .or_insert_with(|| Vessel::new(id))
        };

        for pv in &update.values {
            apply_value(vessel, pv);
        }
        vessel.apply_heading_attribute(attribute);
        vessel.last_update = Some(received_at);

        if is_self {
            self.active_id.is_none()
        } else {
            self.active_id
                .as_ref()
                .is_some_and(|id| id.as_str() == update.context)
        }
    }

    /// Remove AIS targets not updated within `max_age` of `now`.
    ///
    /// Returns the removed ids. The active selection is left untouched; the
    /// caller decides how to fall back.
    pub fn expire_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> Vec<VesselId> {
        let stale: Vec<VesselId> = self
            .targets
            .iter()
            .filter(|(_, v)| {
                v.last_update
                    .is_none_or(|t| now.signed_duration_since(t) > max_age)
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.targets.remove(id);
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "expired stale AIS targets");
        }
        stale
    }

    /// Return `true` when the active id no longer names a known target.
    pub fn active_is_dangling(&self) -> bool {
        self.active_id
            .as_ref()
            .is_some_and(|id| !self.targets.contains_key(id))
    }

    /// Re-derive selected heading, COG and wind direction everywhere.
    pub fn apply_heading_attribute(&mut self, attribute: HeadingAttribute) {
        self.own.apply_heading_attribute(attribute);
        for v in self.targets.values_mut() {
            v.apply_heading_attribute(attribute);
        }
    }

    fn is_self_context(&self, context: &str) -> bool {
        context == Vessel::SELF_CONTEXT || self.self_context.as_deref() == Some(context)
    }
}

fn as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(doc: &serde_json::Value, key: &str) -> Option<String> {
    doc.get(key).and_then(as_text)
}

fn apply_value(vessel: &mut Vessel, pv: &PathValue) {
    let number = pv.value.as_f64();
    match pv.path.as_str() {
        "" => {
            if let Some(name) = string_field(&pv.value, "name") {
                vessel.name = Some(name);
            }
            if let Some(mmsi) = string_field(&pv.value, "mmsi") {
                vessel.mmsi = Some(mmsi);
            }
        }
        "name" => vessel.name = as_text(&pv.value),
        "mmsi" => vessel.mmsi = as_text(&pv.value),
        "navigation.position" => {
            let lat = pv.value.get("latitude").and_then(serde_json::Value::as_f64);
            let lon = pv.value.get("longitude").and_then(serde_json::Value::as_f64);
            if let (Some(lat), Some(lon)) = (lat, lon) {
                let p = Position::new(lon, lat);
                if p.is_valid() {
                    vessel.position = p;
                }
            }
        }
        "navigation.headingTrue" => vessel.heading_true = number,
        "navigation.headingMagnetic" => vessel.heading_magnetic = number,
        "navigation.courseOverGroundTrue" => vessel.cog_true = number,
        "navigation.courseOverGroundMagnetic" => vessel.cog_magnetic = number,
        "navigation.speedOverGround" => vessel.sog = number,
        "navigation.magneticVariation" => vessel.magnetic_variation = number,
        "environment.wind.angleApparent" => vessel.wind.awa = number,
        "environment.wind.speedApparent" => vessel.wind.aws = number,
        "environment.wind.directionTrue" => vessel.wind.twd = number,
        "environment.wind.directionMagnetic" => vessel.wind.mwd = number,
        other => trace!(path = other, "ignoring path"),
    }
}
