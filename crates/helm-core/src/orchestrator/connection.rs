//! Discovery, stream lifecycle and the post-connect query protocol.

use helm_types::{Delta, PlaybackQuery, RequestId, ServerInfo, SessionMode};
use tracing::{debug, info, warn};

use super::auth::LoginContext;
use super::{Continuation, DISCOVERY_PATH, IDENTITY_PATH, Orchestrator, PendingTransition, Purpose};
use crate::modal::{ModalRequest, Notice};
use crate::ports::RequestError;
use crate::stream::{LinkState, StreamEvent};

impl Orchestrator {
    pub(super) fn discover(&mut self) {
        let id = self.issue_request(Purpose::Discovery);
        debug!(request = %id, "requesting discovery document");
        self.api.get(id, DISCOVERY_PATH);
    }

    /// Open the stream, or with `restart` close it and reopen once the close
    /// has been observed.
    pub(super) fn open_stream(
        &mut self,
        options: Option<PlaybackQuery>,
        mode: SessionMode,
        restart: bool,
    ) {
        if restart {
            if self.pending.arm(options, mode) {
                debug!(mode = %mode, "replacing pending reopen");
            }
            if let Some(closed) = self.stream.close() {
                self.on_stream_event(closed);
            }
            return;
        }

        match self.stream.open(options.as_ref(), mode) {
            Ok(()) => {
                self.cancel_connect_timer();
                if let Some(after) = self.config.server.connect_timeout() {
                    self.connect_timer = Some(self.scheduler.start_timeout(after));
                }
            }
            Err(e) => warn!(error = %e, "cannot open stream"),
        }
    }

    pub(super) fn on_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected { mode } => self.on_connected(mode),
            StreamEvent::Delta(Delta::Hello(hello)) => {
                self.mode = if hello.playback {
                    SessionMode::Playback
                } else {
                    SessionMode::Realtime
                };
                info!(mode = %self.mode, self_id = ?hello.self_id, "stream hello");
                self.vessels.set_self_context(hello.self_id.as_deref());
                self.self_id = hello.self_id;
            }
            StreamEvent::Delta(Delta::Update(update)) => self.on_update(&update),
            StreamEvent::Error(_) => {
                self.presenter.notify(Notice::transient("Connection Error!"));
            }
            StreamEvent::Closed {
                by_command,
                playback,
            } => self.on_closed(by_command, playback),
        }
    }

    fn on_connected(&mut self, mode: SessionMode) {
        info!(mode = %mode, "connection open");
        self.cancel_connect_timer();
        self.presenter.notify(Notice::transient("Connection Open."));
        self.query_after_connect();
        self.start_trail_timer();
    }

    fn on_closed(&mut self, by_command: bool, playback: bool) {
        self.stop_trail_timer();
        self.cancel_connect_timer();
        // Queries issued on the old connection are void.
        self.requests.retain(|_, purpose| {
            !matches!(purpose, Purpose::Identity | Purpose::NavigationStatus)
        });

        if by_command {
            match self.pending.take() {
                PendingTransition::PendingOpen { options, mode } => {
                    info!(mode = %mode, "reopening stream");
                    self.open_stream(options, mode, false);
                }
                PendingTransition::None => debug!("stream closed with nothing pending"),
            }
            return;
        }

        warn!(playback, "connection lost");
        self.pending = PendingTransition::None;
        self.present(reconnect_prompt(playback), Continuation::Reconnect { playback });
    }

    pub(super) fn on_connect_timeout(&mut self) {
        if self.stream.state() != LinkState::Connecting {
            return;
        }
        let playback = self.stream.mode().is_playback();
        warn!(
            timeout_ms = self.config.server.connect_timeout_ms,
            playback, "connection attempt timed out"
        );
        self.stream.abort();
        self.pending = PendingTransition::None;
        self.present(reconnect_prompt(playback), Continuation::Reconnect { playback });
    }

    /// Start the post-connect query protocol with the identity fetch. The
    /// remaining queries follow once it has answered.
    pub(super) fn query_after_connect(&mut self) {
        let id = self.issue_request(Purpose::Identity);
        self.api.get(id, IDENTITY_PATH);
    }

    fn query_context(&mut self) {
        let context = self
            .vessels
            .active_id()
            .map_or_else(|| "vessels/self".to_owned(), |id| id.as_str().replace('.', "/"));
        let id = self.issue_request(Purpose::NavigationStatus);
        self.api.get(id, &format!("/{context}/navigation"));

        self.resources
            .get_routes(&self.vessels.active().id, self.generation);
        self.resources.get_waypoints();
        self.resources.get_charts();
        self.resources.get_notes();
        self.alarms.query_anchor_status(
            self.vessels.active_id(),
            self.vessels.active().position,
            self.generation,
        );
    }

    pub(super) fn on_response(
        &mut self,
        request: RequestId,
        result: Result<serde_json::Value, RequestError>,
    ) {
        let Some(purpose) = self.requests.remove(&request) else {
            debug!(%request, "dropping response to unknown request");
            return;
        };
        match (purpose, result) {
            (Purpose::Discovery, Ok(doc)) => {
                let info = ServerInfo::from_discovery(&doc);
                info!(server = ?info.id, version = ?info.version, "server discovered");
                self.server = Some(info);
                self.open_stream(None, SessionMode::Realtime, false);
            }
            (Purpose::Discovery, Err(e)) => {
                warn!(error = %e, "discovery failed");
                self.present(
                    ModalRequest::alert_with(
                        "Connection Error:",
                        "Unable to contact Signal K server!",
                        "Try Again",
                    ),
                    Continuation::DiscoveryRetry,
                );
            }
            (Purpose::Identity, Ok(doc)) => {
                self.vessels.apply_identity(&doc);
                self.query_context();
            }
            (Purpose::Identity, Err(e)) if e.is_unauthorized() => {
                info!("identity fetch unauthorised");
                self.show_login(LoginContext::OnConnect);
            }
            (Purpose::Identity, Err(e)) => {
                debug!(error = %e, "no vessel data available");
                self.query_context();
            }
            (Purpose::NavigationStatus, Ok(doc)) => {
                if let Some(href) = active_route_href(&doc) {
                    debug!(href, "active route from course status");
                    self.resources.process_active_route(href);
                }
            }
            (Purpose::NavigationStatus, Err(e)) => {
                debug!(error = %e, "no navigation data available");
            }
            (Purpose::Login, result) => self.on_login_result(result),
        }
    }
}

/// The alert shown when a connection is lost or never opens.
fn reconnect_prompt(playback: bool) -> ModalRequest {
    if playback {
        ModalRequest::alert_with(
            "Connection Closed:",
            "Unable to open Playback connection.",
            "OK",
        )
    } else {
        ModalRequest::alert_with(
            "Connection Closed:",
            "Connection to the Signal K server has been closed.",
            "Re-connect",
        )
    }
}

/// `activeRoute.href` of the course in a navigation document. Great circle
/// wins over rhumb line.
fn active_route_href(doc: &serde_json::Value) -> Option<&str> {
    ["courseGreatCircle", "courseRhumbline"]
        .iter()
        .filter_map(|course| doc.get(*course))
        .find_map(|course| course.pointer("/activeRoute/href/value"))
        .and_then(serde_json::Value::as_str)
}
