//! View model snapshot handed to the presentation layer.

use chrono::{DateTime, Utc};
use helm_types::{NavigationData, RouteId, ServerInfo, SessionMode, VesselId};
use serde::Serialize;

/// Visibility of the navigation data panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NavPanel {
    /// Show the panel.
    pub show: bool,
    /// Show the previous/next point controls.
    pub next_point_control: bool,
}

/// Everything the presentation layer renders from the session core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// Current session mode.
    pub mode: SessionMode,
    /// A stream connection is open.
    pub connected: bool,
    /// Server identity from discovery.
    pub server: Option<ServerInfo>,
    /// Own-ship context announced by the server.
    pub self_id: Option<String>,
    /// Active AIS target, `None` when the own ship is active.
    pub active_vessel: Option<VesselId>,
    /// Active route of the active vessel.
    pub active_route: Option<RouteId>,
    /// Derived navigation data.
    pub navigation: NavigationData,
    /// Navigation panel visibility.
    pub nav_panel: NavPanel,
    /// Timestamp of the last replayed update, playback only.
    pub playback_time: Option<DateTime<Utc>>,
    /// An auth token is held.
    pub has_token: bool,
    /// Number of samples in the active trail.
    pub trail_len: usize,
}
