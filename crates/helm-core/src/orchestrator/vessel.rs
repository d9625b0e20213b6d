//! Active vessel, telemetry updates, route commands and trail sampling.

use chrono::Utc;
use helm_types::{Direction, RouteId, SessionMode, Update, VesselId};
use tracing::{debug, info, trace};

use super::{Continuation, Orchestrator};
use crate::config::SessionConfig;
use crate::event::ResourceEvent;
use crate::modal::ModalRequest;
use crate::trail::TrailKey;

impl Orchestrator {
    /// Make `id` the active vessel, or the own ship for `None` and unknown
    /// ids. Route and alarm queries go out under a fresh generation.
    pub(super) fn switch_active_vessel(&mut self, id: Option<VesselId>) {
        self.generation = self.generation.next();
        let found = self.vessels.select(id.as_ref());
        self.active_route = None;
        self.trail.clear();
        self.navigation.clear();

        self.alarms.query_anchor_status(
            self.vessels.active_id(),
            self.vessels.active().position,
            self.generation,
        );
        self.resources
            .get_routes(&self.vessels.active().id, self.generation);
        self.alarms.clear_alarms();
        self.update_nav_panel();

        info!(
            requested = ?id.as_ref().map(VesselId::as_str),
            found,
            active = %self.vessels.active().id,
            generation = %self.generation,
            "active vessel switched"
        );
    }

    pub(super) fn on_update(&mut self, update: &Update) {
        self.playback_time = match self.mode {
            SessionMode::Playback => update.timestamp,
            SessionMode::Realtime => None,
        };
        let touched = self.vessels.apply_update(
            update,
            Utc::now(),
            self.config.selections.heading_attribute,
        );
        trace!(context = %update.context, values = update.values.len(), touched, "update");
        if touched {
            self.update_nav_panel();
        }
    }

    pub(super) fn on_resource(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::RoutesLoaded {
                generation,
                active_route,
            } => {
                if generation != self.generation {
                    debug!(%generation, current = %self.generation, "dropping stale routes");
                    return;
                }
                debug!(route = ?active_route.as_ref().map(RouteId::as_str), "routes loaded");
                self.active_route = active_route;
                self.update_nav_panel();
            }
            ResourceEvent::RoutesFailed { generation, error } => {
                if generation != self.generation {
                    debug!(%generation, "dropping stale route failure");
                    return;
                }
                debug!(error = %error, "routes unavailable");
            }
            ResourceEvent::NextPoint(point) => {
                self.navigation.set_next_point(point);
                self.update_nav_panel();
            }
            ResourceEvent::ActiveRouteCleared => {
                debug!("active route cleared");
                self.active_route = None;
                self.navigation.set_next_point(None);
                self.update_nav_panel();
            }
        }
    }

    /// Recompute navigation data for the active vessel and derive panel
    /// visibility.
    pub(super) fn update_nav_panel(&mut self) {
        let coords = if self.active_route.is_some() {
            self.resources.active_route_coords()
        } else {
            Vec::new()
        };
        self.navigation.recompute(
            &coords,
            self.vessels.active(),
            self.config.selections.heading_attribute,
        );
        let has_route = self.active_route.is_some();
        self.nav_panel.show = has_route && self.navigation.data().position.is_some();
        self.nav_panel.next_point_control = has_route;
    }

    pub(super) fn on_trail_tick(&mut self) {
        let expired = self
            .vessels
            .expire_stale(Utc::now(), self.config.ais.max_age());
        if !expired.is_empty() && self.vessels.active_is_dangling() {
            info!("active target expired, falling back to self");
            self.switch_active_vessel(None);
        }

        if !self.config.trail.enabled {
            return;
        }
        if self.trail_load.is_some() {
            trace!("trail load outstanding, skipping sample");
            return;
        }

        let vessel = self.vessels.active();
        if vessel.last_update.is_none() || !vessel.position.is_valid() {
            return;
        }
        let position = vessel.position;
        if self.trail.append(position) {
            trace!(samples = self.trail.len(), "trail sampled");
        }
        self.store
            .save_trail(TrailKey::for_mode(self.mode), &self.trail.to_vec());
    }

    // -----------------------------------------------------------------------
    // Route commands
    // -----------------------------------------------------------------------

    pub(super) fn activate_route(&mut self, route: &RouteId) {
        info!(%route, vessel = %self.vessels.active().id, "activating route");
        self.resources
            .activate_route(route, &self.vessels.active().id, self.generation);
    }

    pub(super) fn deactivate_route(&mut self) {
        if self.active_route.is_some() {
            info!(vessel = %self.vessels.active().id, "clearing active route");
            self.resources
                .clear_active_route(&self.vessels.active().id, self.generation);
        } else {
            debug!("no active route, clearing next point");
            self.resources.set_next_point(None);
        }
    }

    pub(super) fn advance_point(&mut self, direction: Direction) {
        let coords = self.resources.active_route_coords();
        match self.navigation.advance_point(direction, &coords) {
            Some(point) => self.resources.set_next_point(Some(point)),
            None => debug!(?direction, "point index at boundary"),
        }
    }

    pub(super) fn clear_trail(&mut self, prompt: bool) {
        if prompt {
            self.present(
                ModalRequest::confirm(
                    "Clear Vessel Trail",
                    "Do you want to delete the vessel trail?",
                ),
                Continuation::ConfirmClearTrail,
            );
        } else {
            self.trail.clear();
        }
    }

    // -----------------------------------------------------------------------
    // Settings and imports
    // -----------------------------------------------------------------------

    pub(super) fn apply_settings(&mut self, config: SessionConfig) {
        self.stream
            .reconfigure(config.server.clone(), config.stream.clone());
        let attribute = config.selections.heading_attribute;
        let changed = attribute != self.config.selections.heading_attribute;
        self.config = config;
        if changed {
            info!(?attribute, "heading attribute changed");
            self.vessels.apply_heading_attribute(attribute);
            self.update_nav_panel();
        }
    }

    pub(super) fn on_resources_imported(&mut self, failures: usize) {
        info!(failures, "resource import finished");
        self.resources
            .get_routes(&self.vessels.active().id, self.generation);
        self.resources.get_waypoints();
        let message = if failures == 0 {
            "GPX file resources loaded successfully."
        } else {
            "Completed with errors!\nNot all resources were loaded."
        };
        self.present(
            ModalRequest::alert("Load Resources:", message),
            Continuation::Informational,
        );
    }
}
