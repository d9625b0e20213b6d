//! Recording fakes and a harness for driving the orchestrator.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use helm_core::config::SessionConfig;
use helm_core::event::{SessionEvent, TransportEvent};
use helm_core::modal::{ModalRequest, ModalResponse, Notice};
use helm_core::orchestrator::Orchestrator;
use helm_core::ports::{
    AlarmService, Endpoint, Ports, Presenter, RequestError, ResourceStore, Scheduler, ServerApi,
    SessionStore, Transport,
};
use helm_core::trail::TrailKey;
use helm_types::{
    Credentials, Generation, LoadTicket, ModalTicket, Position, RequestId, RouteId, TimerId,
    VesselId,
};
use serde_json::{Value, json};

pub const DISCOVERY: &str = "/signalk";
pub const IDENTITY: &str = "/vessels/self";
pub const SELF_NAVIGATION: &str = "/vessels/self/navigation";
pub const REALTIME_URL: &str = "ws://localhost:3000/signalk/v1/stream?subscribe=none";

/// Everything the orchestrator asked of its collaborators, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect(String),
    Disconnect,
    Send(String),
    Get(RequestId, String),
    Login(RequestId, String),
    GetRoutes(VesselId, Generation),
    GetWaypoints,
    GetCharts,
    GetNotes,
    ActivateRoute(RouteId, VesselId, Generation),
    ClearActiveRoute(VesselId, Generation),
    SetNextPoint(Option<Position>),
    ProcessActiveRoute(String),
    QueryAnchor(Option<VesselId>, Generation),
    ClearAlarms,
    SaveTrail(TrailKey, Vec<Position>),
    LoadTrail(TrailKey, LoadTicket),
    SaveToken(Option<String>),
    Present(ModalTicket, ModalRequest),
    Notify(String),
    StartInterval(TimerId, Duration),
    StartTimeout(TimerId, Duration),
    Cancel(TimerId),
}

pub type Log = Arc<Mutex<Vec<Call>>>;

#[derive(Clone)]
struct Recorder {
    log: Log,
    coords: Arc<Mutex<Vec<Position>>>,
    next_timer: Arc<Mutex<TimerId>>,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

impl Transport for Recorder {
    fn connect(&mut self, endpoint: &Endpoint) {
        self.push(Call::Connect(endpoint.url.clone()));
    }
    fn disconnect(&mut self) {
        self.push(Call::Disconnect);
    }
    fn send(&mut self, frame: String) {
        self.push(Call::Send(frame));
    }
}

impl ServerApi for Recorder {
    fn get(&mut self, request: RequestId, path: &str) {
        self.push(Call::Get(request, path.to_owned()));
    }
    fn login(&mut self, request: RequestId, credentials: &Credentials) {
        self.push(Call::Login(request, credentials.user.clone()));
    }
}

impl ResourceStore for Recorder {
    fn get_routes(&mut self, vessel: &VesselId, generation: Generation) {
        self.push(Call::GetRoutes(vessel.clone(), generation));
    }
    fn get_waypoints(&mut self) {
        self.push(Call::GetWaypoints);
    }
    fn get_charts(&mut self) {
        self.push(Call::GetCharts);
    }
    fn get_notes(&mut self) {
        self.push(Call::GetNotes);
    }
    fn activate_route(&mut self, route: &RouteId, vessel: &VesselId, generation: Generation) {
        self.push(Call::ActivateRoute(route.clone(), vessel.clone(), generation));
    }
    fn clear_active_route(&mut self, vessel: &VesselId, generation: Generation) {
        self.push(Call::ClearActiveRoute(vessel.clone(), generation));
    }
    fn set_next_point(&mut self, point: Option<Position>) {
        self.push(Call::SetNextPoint(point));
    }
    fn process_active_route(&mut self, href: &str) {
        self.push(Call::ProcessActiveRoute(href.to_owned()));
    }
    fn active_route_coords(&self) -> Vec<Position> {
        self.coords.lock().unwrap().clone()
    }
}

impl AlarmService for Recorder {
    fn query_anchor_status(
        &mut self,
        vessel: Option<&VesselId>,
        _position: Position,
        generation: Generation,
    ) {
        self.push(Call::QueryAnchor(vessel.cloned(), generation));
    }
    fn clear_alarms(&mut self) {
        self.push(Call::ClearAlarms);
    }
}

impl SessionStore for Recorder {
    fn save_trail(&mut self, key: TrailKey, samples: &[Position]) {
        self.push(Call::SaveTrail(key, samples.to_vec()));
    }
    fn load_trail(&mut self, key: TrailKey, ticket: LoadTicket) {
        self.push(Call::LoadTrail(key, ticket));
    }
    fn save_auth_token(&mut self, token: Option<&str>) {
        self.push(Call::SaveToken(token.map(ToOwned::to_owned)));
    }
}

impl Presenter for Recorder {
    fn present(&mut self, ticket: ModalTicket, request: ModalRequest) {
        self.push(Call::Present(ticket, request));
    }
    fn notify(&mut self, notice: Notice) {
        self.push(Call::Notify(notice.message));
    }
}

impl Scheduler for Recorder {
    fn start_interval(&mut self, period: Duration) -> TimerId {
        let id = self.allocate();
        self.push(Call::StartInterval(id, period));
        id
    }
    fn start_timeout(&mut self, after: Duration) -> TimerId {
        let id = self.allocate();
        self.push(Call::StartTimeout(id, after));
        id
    }
    fn cancel(&mut self, id: TimerId) {
        self.push(Call::Cancel(id));
    }
}

impl Recorder {
    fn allocate(&self) -> TimerId {
        let mut next = self.next_timer.lock().unwrap();
        *next = next.next();
        *next
    }
}

/// Build a port bundle whose calls all land in one log.
pub fn recording_ports() -> (Ports, Log, Arc<Mutex<Vec<Position>>>) {
    let recorder = Recorder {
        log: Log::default(),
        coords: Arc::default(),
        next_timer: Arc::default(),
    };
    let log = Arc::clone(&recorder.log);
    let coords = Arc::clone(&recorder.coords);
    let ports = Ports {
        transport: Box::new(recorder.clone()),
        api: Box::new(recorder.clone()),
        resources: Box::new(recorder.clone()),
        alarms: Box::new(recorder.clone()),
        store: Box::new(recorder.clone()),
        presenter: Box::new(recorder.clone()),
        scheduler: Box::new(recorder),
    };
    (ports, log, coords)
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub orch: Orchestrator,
    pub log: Log,
    pub coords: Arc<Mutex<Vec<Position>>>,
    mark: usize,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let (ports, log, coords) = recording_ports();
        Self {
            orch: Orchestrator::new(config, ports),
            log,
            coords,
            mark: 0,
        }
    }

    /// Start, discover, restore an empty trail, open and receive the
    /// realtime hello. Calls made so far are marked as seen.
    pub fn connected() -> Self {
        Self::connected_with(SessionConfig::default())
    }

    pub fn connected_with(config: SessionConfig) -> Self {
        let mut h = Self::with_config(config);
        h.orch.start();
        h.respond(
            DISCOVERY,
            Ok(json!({"server": {"id": "signalk-server-node", "version": "2.0.0"}})),
        );
        let ticket = h.last_load(TrailKey::SelfTrail).unwrap();
        h.dispatch(SessionEvent::TrailLoaded {
            ticket,
            samples: None,
        });
        h.transport(TransportEvent::Opened);
        h.frame(&json!({"self": "vessels.self", "version": "2.0.0", "roles": ["master"]}));
        h.respond(IDENTITY, Ok(json!({"name": "Tern", "mmsi": "235000001"})));
        h.clear();
        h
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        self.orch.dispatch(event);
    }

    pub fn transport(&mut self, event: TransportEvent) {
        self.dispatch(SessionEvent::Transport(event));
    }

    pub fn frame(&mut self, value: &Value) {
        self.transport(TransportEvent::Frame(value.to_string()));
    }

    /// Send an own-ship or target position update.
    pub fn position(&mut self, context: &str, lon: f64, lat: f64) {
        self.frame(&json!({
            "context": context,
            "updates": [{
                "timestamp": "2023-01-01T10:00:00Z",
                "values": [{"path": "navigation.position", "value": {"longitude": lon, "latitude": lat}}]
            }]
        }));
    }

    /// Every call since the harness was built.
    pub fn history(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    /// Calls since the last [`Harness::clear`].
    pub fn calls(&self) -> Vec<Call> {
        self.history().into_iter().skip(self.mark).collect()
    }

    pub fn clear(&mut self) {
        self.mark = self.log.lock().unwrap().len();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Answer the most recent `get` of `path`.
    pub fn respond(&mut self, path: &str, result: Result<Value, RequestError>) {
        let request = self
            .history()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Get(id, p) if p == path => Some(*id),
                _ => None,
            })
            .unwrap();
        self.dispatch(SessionEvent::Response { request, result });
    }

    /// Answer the most recent login request.
    pub fn respond_login(&mut self, result: Result<Value, RequestError>) {
        let request = self
            .history()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Login(id, _) => Some(*id),
                _ => None,
            })
            .unwrap();
        self.dispatch(SessionEvent::Response { request, result });
    }

    pub fn last_modal(&self) -> Option<(ModalTicket, ModalRequest)> {
        self.history().into_iter().rev().find_map(|c| match c {
            Call::Present(ticket, request) => Some((ticket, request)),
            _ => None,
        })
    }

    /// Close the most recently presented modal with `response`.
    pub fn answer(&mut self, response: ModalResponse) {
        let (ticket, _) = self.last_modal().unwrap();
        self.dispatch(SessionEvent::ModalClosed { ticket, response });
    }

    pub fn last_load(&self, key: TrailKey) -> Option<LoadTicket> {
        self.history().into_iter().rev().find_map(|c| match c {
            Call::LoadTrail(k, ticket) if k == key => Some(ticket),
            _ => None,
        })
    }

    pub fn last_saved(&self, key: TrailKey) -> Option<Vec<Position>> {
        self.history().into_iter().rev().find_map(|c| match c {
            Call::SaveTrail(k, samples) if k == key => Some(samples),
            _ => None,
        })
    }

    pub fn last_interval(&self) -> Option<TimerId> {
        self.history().into_iter().rev().find_map(|c| match c {
            Call::StartInterval(id, _) => Some(id),
            _ => None,
        })
    }

    pub fn last_timeout(&self) -> Option<TimerId> {
        self.history().into_iter().rev().find_map(|c| match c {
            Call::StartTimeout(id, _) => Some(id),
            _ => None,
        })
    }

    /// Fire the current trail timer.
    pub fn tick(&mut self) {
        let id = self.last_interval().unwrap();
        self.dispatch(SessionEvent::Timer(id));
    }

    pub fn connects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Connect(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

pub fn unauthorized() -> RequestError {
    RequestError::Status { status: 401 }
}
