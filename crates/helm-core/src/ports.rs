//! Collaborator ports.
//!
//! Every collaborator the session core talks to sits behind one of these
//! traits. All calls are non-blocking: the implementation starts the work and
//! later delivers the outcome as a [`SessionEvent`](crate::event::SessionEvent)
//! carrying the correlation token it was handed. The only synchronous read is
//! [`ResourceStore::active_route_coords`], which answers from the store's own
//! cache.
//!
//! Tests substitute recording fakes; production code wires real network,
//! storage and UI implementations.

use std::time::Duration;

use helm_types::{
    Credentials, Generation, LoadTicket, ModalTicket, Position, RequestId, RouteId, SessionMode,
    TimerId, VesselId,
};

use crate::modal::{ModalRequest, Notice};
use crate::trail::TrailKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure reported by the request interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The request never produced a status (network failure, bad payload).
    #[error("request failed: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

impl RequestError {
    /// HTTP status for [`RequestError::Status`].
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// Return `true` for a 401 status.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 })
    }
}

// ---------------------------------------------------------------------------
// Stream transport
// ---------------------------------------------------------------------------

/// Where a stream connection should be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Mode the connection is opened for.
    pub mode: SessionMode,
    /// Full URL including query string.
    pub url: String,
}

/// Low-level websocket client used by the stream session.
///
/// Outcomes arrive as [`TransportEvent`](crate::event::TransportEvent)s.
pub trait Transport {
    /// Start connecting to `endpoint`.
    fn connect(&mut self, endpoint: &Endpoint);

    /// Close the current connection. A `Closed` event follows if a
    /// connection was open or in progress.
    fn disconnect(&mut self);

    /// Send a text frame on the open connection.
    fn send(&mut self, frame: String);
}

// ---------------------------------------------------------------------------
// Request interface
// ---------------------------------------------------------------------------

/// One-shot HTTP requests against the server API.
///
/// Each call is answered by exactly one
/// [`SessionEvent::Response`](crate::event::SessionEvent::Response) with the
/// same [`RequestId`].
pub trait ServerApi {
    /// `GET` an API path, e.g. `/vessels/self`.
    fn get(&mut self, request: RequestId, path: &str);

    /// Authenticate. A successful response body carries `{"token": ...}`.
    fn login(&mut self, request: RequestId, credentials: &Credentials);
}

// ---------------------------------------------------------------------------
// Resources and alarms
// ---------------------------------------------------------------------------

/// Routes, waypoints, charts and notes held on the server.
///
/// Route queries echo the [`Generation`] they were issued under in the
/// resulting [`ResourceEvent`](crate::event::ResourceEvent).
pub trait ResourceStore {
    /// Fetch routes, including which one is active for `vessel`.
    fn get_routes(&mut self, vessel: &VesselId, generation: Generation);

    /// Fetch waypoints.
    fn get_waypoints(&mut self);

    /// Fetch chart sources.
    fn get_charts(&mut self);

    /// Fetch notes and regions.
    fn get_notes(&mut self);

    /// Make `route` the active route of `vessel`.
    fn activate_route(&mut self, route: &RouteId, vessel: &VesselId, generation: Generation);

    /// Clear the active route of `vessel`.
    fn clear_active_route(&mut self, vessel: &VesselId, generation: Generation);

    /// Set (or with `None`, clear) the next-point target on the server.
    fn set_next_point(&mut self, point: Option<Position>);

    /// Load the route referenced by a course `activeRoute.href`.
    fn process_active_route(&mut self, href: &str);

    /// Coordinates of the active route from the store's cache.
    fn active_route_coords(&self) -> Vec<Position>;
}

/// Anchor watch and alarm notifications.
pub trait AlarmService {
    /// Query anchor-watch status for the active vessel. Answered by
    /// [`SessionEvent::AnchorStatus`](crate::event::SessionEvent::AnchorStatus).
    fn query_anchor_status(
        &mut self,
        vessel: Option<&VesselId>,
        position: Position,
        generation: Generation,
    );

    /// Drop every displayed alarm.
    fn clear_alarms(&mut self);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Key-value persistence for trails and the auth token.
pub trait SessionStore {
    /// Persist a trail under `key`.
    fn save_trail(&mut self, key: TrailKey, samples: &[Position]);

    /// Load the trail stored under `key`. Answered by
    /// [`SessionEvent::TrailLoaded`](crate::event::SessionEvent::TrailLoaded).
    fn load_trail(&mut self, key: TrailKey, ticket: LoadTicket);

    /// Persist (or with `None`, delete) the auth token.
    fn save_auth_token(&mut self, token: Option<&str>);
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Modal dialogs and transient notices.
pub trait Presenter {
    /// Show a modal. Exactly one
    /// [`SessionEvent::ModalClosed`](crate::event::SessionEvent::ModalClosed)
    /// with the same ticket must follow.
    fn present(&mut self, ticket: ModalTicket, request: ModalRequest);

    /// Show a transient, non-blocking notice.
    fn notify(&mut self, notice: Notice);
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// Timer service. Fires arrive as
/// [`SessionEvent::Timer`](crate::event::SessionEvent::Timer).
pub trait Scheduler {
    /// Start a repeating timer.
    fn start_interval(&mut self, period: Duration) -> TimerId;

    /// Start a one-shot timer.
    fn start_timeout(&mut self, after: Duration) -> TimerId;

    /// Stop a timer. Cancelling an unknown or finished timer is a no-op.
    fn cancel(&mut self, id: TimerId);
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The full set of collaborators handed to the orchestrator.
pub struct Ports {
    /// Websocket client.
    pub transport: Box<dyn Transport + Send>,
    /// HTTP API client.
    pub api: Box<dyn ServerApi + Send>,
    /// Resource store.
    pub resources: Box<dyn ResourceStore + Send>,
    /// Alarm service.
    pub alarms: Box<dyn AlarmService + Send>,
    /// Key-value store.
    pub store: Box<dyn SessionStore + Send>,
    /// Dialogs and notices.
    pub presenter: Box<dyn Presenter + Send>,
    /// Timer service.
    pub scheduler: Box<dyn Scheduler + Send>,
}

impl core::fmt::Debug for Ports {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}
