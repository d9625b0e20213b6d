//! End-to-end runs of the tokio session runner.
//!
//! Collaborators answer through the event queue the way real network,
//! storage and UI adapters would; time is virtual.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use helm_core::config::SessionConfig;
use helm_core::event::{SessionEvent, TransportEvent, UserAction};
use helm_core::modal::{ModalRequest, ModalResponse, Notice};
use helm_core::orchestrator::Orchestrator;
use helm_core::ports::{
    AlarmService, Endpoint, Ports, Presenter, ResourceStore, ServerApi, SessionStore, Transport,
};
use helm_core::runner::{self, EndReason, EventSender, SessionRunner, TokioScheduler};
use helm_core::trail::TrailKey;
use helm_types::{
    Credentials, Generation, LoadTicket, ModalTicket, Position, RequestId, RouteId, VesselId,
};
use serde_json::json;

/// Answers every call by posting the completion back into the queue.
#[derive(Clone)]
struct Loopback {
    events: EventSender,
    saved: Arc<Mutex<Vec<(TrailKey, Vec<Position>)>>>,
}

impl Loopback {
    fn frame(&self, value: &serde_json::Value) {
        self.events.send(SessionEvent::Transport(TransportEvent::Frame(
            value.to_string(),
        )));
    }
}

impl Transport for Loopback {
    fn connect(&mut self, _endpoint: &Endpoint) {
        self.events
            .send(SessionEvent::Transport(TransportEvent::Opened));
        self.frame(&json!({"self": "vessels.self", "version": "2.0.0", "roles": ["master"]}));
        self.frame(&json!({
            "context": "vessels.self",
            "updates": [{"values": [
                {"path": "navigation.position", "value": {"longitude": 4.0, "latitude": 52.0}}
            ]}]
        }));
    }
    fn disconnect(&mut self) {
        self.events
            .send(SessionEvent::Transport(TransportEvent::Closed));
    }
    fn send(&mut self, _frame: String) {}
}

impl ServerApi for Loopback {
    fn get(&mut self, request: RequestId, _path: &str) {
        self.events.send(SessionEvent::Response {
            request,
            result: Ok(json!({})),
        });
    }
    fn login(&mut self, request: RequestId, _credentials: &Credentials) {
        self.events.send(SessionEvent::Response {
            request,
            result: Ok(json!({"token": "t"})),
        });
    }
}

impl ResourceStore for Loopback {
    fn get_routes(&mut self, _vessel: &VesselId, _generation: Generation) {}
    fn get_waypoints(&mut self) {}
    fn get_charts(&mut self) {}
    fn get_notes(&mut self) {}
    fn activate_route(&mut self, _route: &RouteId, _vessel: &VesselId, _generation: Generation) {}
    fn clear_active_route(&mut self, _vessel: &VesselId, _generation: Generation) {}
    fn set_next_point(&mut self, _point: Option<Position>) {}
    fn process_active_route(&mut self, _href: &str) {}
    fn active_route_coords(&self) -> Vec<Position> {
        Vec::new()
    }
}

impl AlarmService for Loopback {
    fn query_anchor_status(
        &mut self,
        _vessel: Option<&VesselId>,
        _position: Position,
        generation: Generation,
    ) {
        self.events.send(SessionEvent::AnchorStatus {
            generation,
            result: Ok(()),
        });
    }
    fn clear_alarms(&mut self) {}
}

impl SessionStore for Loopback {
    fn save_trail(&mut self, key: TrailKey, samples: &[Position]) {
        self.saved.lock().unwrap().push((key, samples.to_vec()));
    }
    fn load_trail(&mut self, _key: TrailKey, ticket: LoadTicket) {
        self.events.send(SessionEvent::TrailLoaded {
            ticket,
            samples: None,
        });
    }
    fn save_auth_token(&mut self, _token: Option<&str>) {}
}

impl Presenter for Loopback {
    fn present(&mut self, ticket: ModalTicket, _request: ModalRequest) {
        self.events.send(SessionEvent::ModalClosed {
            ticket,
            response: ModalResponse::Acknowledged,
        });
    }
    fn notify(&mut self, _notice: Notice) {}
}

fn loopback_runner() -> (SessionRunner, EventSender, Loopback) {
    let (tx, rx) = runner::channel();
    let loopback = Loopback {
        events: tx.clone(),
        saved: Arc::default(),
    };
    let ports = Ports {
        transport: Box::new(loopback.clone()),
        api: Box::new(loopback.clone()),
        resources: Box::new(loopback.clone()),
        alarms: Box::new(loopback.clone()),
        store: Box::new(loopback.clone()),
        presenter: Box::new(loopback.clone()),
        scheduler: Box::new(TokioScheduler::new(&tx)),
    };
    let orchestrator = Orchestrator::new(SessionConfig::default(), ports);
    (SessionRunner::new(orchestrator, rx), tx, loopback)
}

#[tokio::test(start_paused = true)]
async fn session_samples_trail_until_shutdown() {
    let (mut session, tx, loopback) = loopback_runner();

    let shutdown = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        shutdown.send(SessionEvent::User(UserAction::Shutdown));
    });

    let summary = session.run().await;

    assert_eq!(summary.reason, EndReason::Shutdown);
    assert!(summary.events > 0);
    let orchestrator = session.orchestrator();
    assert!(orchestrator.is_terminated());
    assert_eq!(orchestrator.trail().to_vec(), vec![Position::new(4.0, 52.0)]);

    // Two trail ticks (5 s and 10 s) before the shutdown at 12 s.
    let saved = loopback.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|(key, _)| *key == TrailKey::SelfTrail));
}

#[tokio::test(start_paused = true)]
async fn runner_stops_when_queue_closes() {
    let (ports, _log, _coords) = common::recording_ports();
    let (tx, rx) = runner::channel();
    let mut session = SessionRunner::new(Orchestrator::new(SessionConfig::default(), ports), rx);
    drop(tx);

    let summary = session.run().await;

    assert_eq!(summary.reason, EndReason::ChannelClosed);
    assert_eq!(summary.events, 0);
    assert!(!session.orchestrator().is_terminated());
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_any_traffic() {
    let (mut session, tx, _loopback) = loopback_runner();
    tx.send(SessionEvent::User(UserAction::Shutdown));

    let summary = session.run().await;

    // Start-up completions queue behind the shutdown and are never seen.
    assert_eq!(summary.reason, EndReason::Shutdown);
    assert_eq!(summary.events, 1);
    assert!(session.orchestrator().is_terminated());
}
