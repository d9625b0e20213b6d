//! Session core for the Helm navigation client.
//!
//! This crate owns the client side of a Signal K session: the telemetry
//! stream connection, realtime/playback switching, the active vessel and
//! route, trail recording and the derived navigation data. Everything that
//! touches the network, storage or the screen sits behind a port trait, so
//! the core itself is a deterministic state machine driven by
//! [`SessionEvent`]s.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides.
//! - [`logging`] -- `tracing` subscriber bootstrap.
//! - [`ports`] -- Collaborator traits the core drives.
//! - [`event`] -- The single inbound [`SessionEvent`] enum.
//! - [`modal`] -- Modal requests, responses and transient notices.
//! - [`stream`] -- Stream session: endpoint, handshake, subscription, decode.
//! - [`vessels`] -- Own ship and AIS target registry.
//! - [`trail`] -- Capped, de-duplicated position trail.
//! - [`navigation`] -- Navigation aggregator and great-circle math.
//! - [`orchestrator`] -- Session orchestrator.
//! - [`view`] -- View model snapshot.
//! - [`runner`] -- Tokio event loop and timer service.

pub mod config;
pub mod event;
pub mod logging;
pub mod modal;
pub mod navigation;
pub mod orchestrator;
pub mod ports;
pub mod runner;
pub mod stream;
pub mod trail;
pub mod vessels;
pub mod view;

pub use config::{ConfigError, SessionConfig};
pub use event::{ResourceEvent, SessionEvent, TransportEvent, UserAction};
pub use modal::{ModalRequest, ModalResponse, Notice};
pub use navigation::NavigationAggregator;
pub use orchestrator::{Orchestrator, PendingTransition};
pub use ports::{Ports, RequestError};
pub use runner::{EventSender, RunSummary, SessionRunner, TokioScheduler};
pub use stream::{LinkState, StreamSession};
pub use trail::{Trail, TrailKey};
pub use vessels::VesselRegistry;
pub use view::ViewModel;
