//! Session orchestrator.
//!
//! The orchestrator is the single owner of session state: mode, vessel
//! selection, active route, trail and navigation data. It reacts to one
//! [`SessionEvent`] at a time through [`Orchestrator::dispatch`] and talks to
//! its collaborators through the non-blocking [`ports`](crate::ports).
//!
//! Every asynchronous call is tagged with a token and the continuation is
//! parked in a table keyed by it:
//!
//! - requests by [`RequestId`] (what the response is for),
//! - modals by [`ModalTicket`] (what to do with the user's choice),
//! - route and alarm queries by [`Generation`] (which vessel selection),
//! - trail loads by [`LoadTicket`],
//! - timers by [`TimerId`].
//!
//! A completion whose token is unknown or stale is logged and dropped.
//!
//! # Submodules
//!
//! - `connection` -- discovery, stream lifecycle, post-connect queries
//! - `mode` -- realtime/playback switching and trail persistence
//! - `auth` -- login flow
//! - `vessel` -- active vessel, deltas, route commands, trail sampling

mod auth;
mod connection;
mod mode;
mod vessel;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use helm_types::{
    Generation, LoadTicket, ModalTicket, PlaybackQuery, RequestId, RouteId, ServerInfo,
    SessionMode, TimerId,
};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::event::{SessionEvent, UserAction};
use crate::modal::{ModalRequest, ModalResponse};
use crate::navigation::NavigationAggregator;
use crate::ports::{
    AlarmService, Ports, Presenter, ResourceStore, Scheduler, ServerApi, SessionStore,
};
use crate::stream::{LinkState, StreamSession};
use crate::trail::Trail;
use crate::vessels::VesselRegistry;
use crate::view::{NavPanel, ViewModel};

use self::auth::LoginContext;

/// Period of the trail sampling timer.
pub const TRAIL_INTERVAL: Duration = Duration::from_secs(5);

/// Discovery document path.
pub const DISCOVERY_PATH: &str = "/signalk";

/// Own-ship identity path.
pub const IDENTITY_PATH: &str = "/vessels/self";

/// A reopen deferred until the current connection has closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingTransition {
    /// Nothing to do on close.
    #[default]
    None,
    /// Reopen with these parameters once the close arrives.
    PendingOpen {
        /// Playback query, if reopening in playback.
        options: Option<PlaybackQuery>,
        /// Mode to reopen in.
        mode: SessionMode,
    },
}

impl PendingTransition {
    /// Arm a reopen. A reopen already pending is replaced.
    ///
    /// Returns `true` when something was already pending.
    pub fn arm(&mut self, options: Option<PlaybackQuery>, mode: SessionMode) -> bool {
        let replaced = self.is_pending();
        *self = Self::PendingOpen { options, mode };
        replaced
    }

    /// Take the pending reopen, leaving [`PendingTransition::None`].
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Return `true` when a reopen is pending.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::PendingOpen { .. })
    }
}

/// What an outstanding request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Discovery,
    Identity,
    NavigationStatus,
    Login,
}

/// What to do when a modal closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    DiscoveryRetry,
    Reconnect { playback: bool },
    ConfirmEnterPlayback,
    ConfirmExitPlayback,
    PlaybackSettings,
    Login,
    LoginRetry,
    ConfirmClearTrail,
    Informational,
}

/// The session orchestrator.
pub struct Orchestrator {
    config: SessionConfig,
    stream: StreamSession,
    api: Box<dyn ServerApi + Send>,
    resources: Box<dyn ResourceStore + Send>,
    alarms: Box<dyn AlarmService + Send>,
    store: Box<dyn SessionStore + Send>,
    presenter: Box<dyn Presenter + Send>,
    scheduler: Box<dyn Scheduler + Send>,

    mode: SessionMode,
    vessels: VesselRegistry,
    trail: Trail,
    navigation: NavigationAggregator,
    active_route: Option<RouteId>,
    pending: PendingTransition,

    generation: Generation,
    next_request: RequestId,
    requests: BTreeMap<RequestId, Purpose>,
    next_ticket: ModalTicket,
    modals: BTreeMap<ModalTicket, Continuation>,
    next_load: LoadTicket,
    trail_load: Option<LoadTicket>,
    trail_timer: Option<TimerId>,
    connect_timer: Option<TimerId>,
    login: Option<LoginContext>,

    server: Option<ServerInfo>,
    self_id: Option<String>,
    playback_time: Option<DateTime<Utc>>,
    has_token: bool,
    nav_panel: NavPanel,
    terminated: bool,
}

impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("mode", &self.mode)
            .field("stream", &self.stream)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator over the given collaborators. Nothing happens
    /// until [`Orchestrator::start`].
    pub fn new(config: SessionConfig, ports: Ports) -> Self {
        let stream = StreamSession::new(
            ports.transport,
            config.server.clone(),
            config.stream.clone(),
        );
        Self {
            config,
            stream,
            api: ports.api,
            resources: ports.resources,
            alarms: ports.alarms,
            store: ports.store,
            presenter: ports.presenter,
            scheduler: ports.scheduler,
            mode: SessionMode::Realtime,
            vessels: VesselRegistry::new(),
            trail: Trail::new(),
            navigation: NavigationAggregator::new(),
            active_route: None,
            pending: PendingTransition::None,
            generation: Generation::default(),
            next_request: RequestId::default(),
            requests: BTreeMap::new(),
            next_ticket: ModalTicket::default(),
            modals: BTreeMap::new(),
            next_load: LoadTicket::default(),
            trail_load: None,
            trail_timer: None,
            connect_timer: None,
            login: None,
            server: None,
            self_id: None,
            playback_time: None,
            has_token: false,
            nav_panel: NavPanel::default(),
            terminated: false,
        }
    }

    /// Restore the stored live trail and contact the server.
    pub fn start(&mut self) {
        if self.terminated {
            return;
        }
        info!(
            host = %self.config.server.host,
            port = self.config.server.port,
            ssl = self.config.server.ssl,
            "session starting"
        );
        self.begin_trail_load();
        self.discover();
    }

    /// Process one event.
    pub fn dispatch(&mut self, event: SessionEvent) {
        if self.terminated {
            debug!("ignoring event after shutdown");
            return;
        }
        match event {
            SessionEvent::Transport(ev) => {
                for out in self.stream.on_transport(ev) {
                    self.on_stream_event(out);
                }
            }
            SessionEvent::Response { request, result } => self.on_response(request, result),
            SessionEvent::Resource(ev) => self.on_resource(ev),
            SessionEvent::AnchorStatus { generation, result } => {
                self.on_anchor_status(generation, result);
            }
            SessionEvent::TrailLoaded { ticket, samples } => self.on_trail_loaded(ticket, samples),
            SessionEvent::ModalClosed { ticket, response } => {
                self.on_modal_closed(ticket, response);
            }
            SessionEvent::Timer(id) => self.on_timer(id),
            SessionEvent::User(action) => self.on_user(action),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current session mode.
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The pending reopen, if any.
    pub const fn pending(&self) -> &PendingTransition {
        &self.pending
    }

    /// Current vessel-switch generation.
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// The vessel registry.
    pub const fn vessels(&self) -> &VesselRegistry {
        &self.vessels
    }

    /// The active trail.
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    /// The active route, if any.
    pub const fn active_route(&self) -> Option<&RouteId> {
        self.active_route.as_ref()
    }

    /// Link state of the stream connection.
    pub const fn link_state(&self) -> LinkState {
        self.stream.state()
    }

    /// The active configuration.
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Return `true` once the session has been shut down.
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> ViewModel {
        ViewModel {
            mode: self.mode,
            connected: self.stream.state() == LinkState::Open,
            server: self.server.clone(),
            self_id: self.self_id.clone(),
            active_vessel: self.vessels.active_id().cloned(),
            active_route: self.active_route.clone(),
            navigation: self.navigation.data().clone(),
            nav_panel: self.nav_panel,
            playback_time: self.playback_time,
            has_token: self.has_token,
            trail_len: self.trail.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch targets
    // -----------------------------------------------------------------------

    fn on_modal_closed(&mut self, ticket: ModalTicket, response: ModalResponse) {
        let Some(continuation) = self.modals.remove(&ticket) else {
            debug!(%ticket, "dropping result of unknown modal");
            return;
        };
        debug!(%ticket, ?continuation, "modal closed");
        match continuation {
            Continuation::DiscoveryRetry => self.discover(),
            Continuation::Reconnect { playback } => {
                if playback {
                    self.show_playback_settings();
                } else {
                    self.switch_mode(SessionMode::Realtime, None);
                }
            }
            Continuation::ConfirmEnterPlayback => {
                if response.accepted() {
                    self.show_playback_settings();
                }
            }
            Continuation::ConfirmExitPlayback => {
                if response.accepted() {
                    self.switch_mode(SessionMode::Realtime, None);
                }
            }
            Continuation::PlaybackSettings => match response {
                ModalResponse::Playback(Some(query)) => {
                    self.switch_mode(SessionMode::Playback, Some(query));
                }
                _ => self.switch_mode(SessionMode::Realtime, None),
            },
            Continuation::Login => {
                let credentials = match response {
                    ModalResponse::Login(credentials) => credentials,
                    _ => None,
                };
                self.on_login_submitted(credentials);
            }
            Continuation::LoginRetry => self.on_login_retry(response.accepted()),
            Continuation::ConfirmClearTrail => {
                if response.accepted() {
                    self.trail.clear();
                }
            }
            Continuation::Informational => {}
        }
    }

    fn on_timer(&mut self, id: TimerId) {
        if self.trail_timer == Some(id) {
            self.on_trail_tick();
        } else if self.connect_timer == Some(id) {
            self.connect_timer = None;
            self.on_connect_timeout();
        } else {
            debug!(timer = %id, "ignoring stale timer");
        }
    }

    fn on_user(&mut self, action: UserAction) {
        debug!(?action, "user action");
        match action {
            UserAction::SwitchActiveVessel(id) => self.switch_active_vessel(id),
            UserAction::SelectMode => self.select_mode(),
            UserAction::RequestPlayback(query) => {
                self.switch_mode(SessionMode::Playback, Some(query));
            }
            UserAction::ExitPlayback => self.switch_mode(SessionMode::Realtime, None),
            UserAction::Login => self.show_login(LoginContext::Menu),
            UserAction::ActivateRoute(route) => self.activate_route(&route),
            UserAction::DeactivateRoute => self.deactivate_route(),
            UserAction::AdvancePoint(direction) => self.advance_point(direction),
            UserAction::ClearTrail { prompt } => self.clear_trail(prompt),
            UserAction::SettingsChanged(config) => self.apply_settings(*config),
            UserAction::ResourcesImported { failures } => self.on_resources_imported(failures),
            UserAction::Shutdown => self.shutdown(),
        }
    }

    fn shutdown(&mut self) {
        info!("session shutting down");
        self.stop_trail_timer();
        self.cancel_connect_timer();
        self.pending = PendingTransition::None;
        // Nothing is pending, so a synthesised close needs no handling.
        let _ = self.stream.close();
        self.requests.clear();
        self.modals.clear();
        self.trail_load = None;
        self.terminated = true;
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    fn issue_request(&mut self, purpose: Purpose) -> RequestId {
        self.next_request = self.next_request.next();
        self.requests.insert(self.next_request, purpose);
        self.next_request
    }

    fn present(&mut self, request: ModalRequest, continuation: Continuation) {
        self.next_ticket = self.next_ticket.next();
        let ticket = self.next_ticket;
        self.modals.insert(ticket, continuation);
        self.presenter.present(ticket, request);
    }

    fn start_trail_timer(&mut self) {
        if let Some(old) = self.trail_timer.take() {
            self.scheduler.cancel(old);
        }
        let id = self.scheduler.start_interval(TRAIL_INTERVAL);
        debug!(timer = %id, "trail timer started");
        self.trail_timer = Some(id);
    }

    fn stop_trail_timer(&mut self) {
        if let Some(id) = self.trail_timer.take() {
            debug!(timer = %id, "trail timer stopped");
            self.scheduler.cancel(id);
        }
    }

    fn cancel_connect_timer(&mut self) {
        if let Some(id) = self.connect_timer.take() {
            self.scheduler.cancel(id);
        }
    }
}
