//! Inbound events.
//!
//! [`SessionEvent`] is the single input type of the orchestrator. Stream
//! frames, request completions, resource and alarm notifications, modal
//! results, timer fires and user actions all funnel through it, so every
//! interleaving is an ordinary sequence of `dispatch` calls.

use helm_types::{
    Direction, Generation, LoadTicket, ModalTicket, PlaybackQuery, Position, RequestId, RouteId,
    TimerId, VesselId,
};

use crate::config::SessionConfig;
use crate::modal::ModalResponse;
use crate::ports::RequestError;

/// Everything the orchestrator reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Websocket lifecycle or frame.
    Transport(TransportEvent),
    /// Completion of a [`ServerApi`](crate::ports::ServerApi) call.
    Response {
        /// Id handed out with the call.
        request: RequestId,
        /// Response body or failure.
        result: Result<serde_json::Value, RequestError>,
    },
    /// Notification from the resource store.
    Resource(ResourceEvent),
    /// Anchor-watch status reply.
    AnchorStatus {
        /// Generation the query was issued under.
        generation: Generation,
        /// `Ok` on success, the failure otherwise.
        result: Result<(), RequestError>,
    },
    /// A trail load completed. `None` when nothing was stored.
    TrailLoaded {
        /// Ticket handed out with the load.
        ticket: LoadTicket,
        /// Stored samples.
        samples: Option<Vec<Position>>,
    },
    /// A modal was closed.
    ModalClosed {
        /// Ticket handed out with the modal.
        ticket: ModalTicket,
        /// What the user chose.
        response: ModalResponse,
    },
    /// A scheduler timer fired.
    Timer(TimerId),
    /// Something the user asked for.
    User(UserAction),
}

/// Websocket lifecycle signals and frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// A transport error. The connection may still be open.
    Error(String),
    /// The connection is gone.
    Closed,
}

/// Notifications from the resource store.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Routes were (re)fetched.
    RoutesLoaded {
        /// Generation the fetch was issued under.
        generation: Generation,
        /// The route currently active for the vessel, if any.
        active_route: Option<RouteId>,
    },
    /// A route query failed.
    RoutesFailed {
        /// Generation the fetch was issued under.
        generation: Generation,
        /// What went wrong.
        error: RequestError,
    },
    /// The next-point target changed. `None` clears it.
    NextPoint(Option<Position>),
    /// The active route was cleared on the server.
    ActiveRouteCleared,
}

/// Actions initiated from the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Make a vessel the active vessel. `None` selects the own ship.
    SwitchActiveVessel(Option<VesselId>),
    /// Ask to toggle between realtime and playback.
    SelectMode,
    /// Start playback for the given time window.
    RequestPlayback(PlaybackQuery),
    /// Return to realtime.
    ExitPlayback,
    /// Open the login dialog.
    Login,
    /// Activate a route for the active vessel.
    ActivateRoute(RouteId),
    /// Clear the active route, or the next point when no route is active.
    DeactivateRoute,
    /// Step the next-point target along the active route.
    AdvancePoint(Direction),
    /// Clear the trail, optionally asking first.
    ClearTrail {
        /// Ask for confirmation before clearing.
        prompt: bool,
    },
    /// Settings were saved.
    SettingsChanged(Box<SessionConfig>),
    /// An external resource import finished.
    ResourcesImported {
        /// Number of resources that failed to load.
        failures: usize,
    },
    /// Tear the session down.
    Shutdown,
}
