//! Shared type definitions for the Helm navigation session core.
//!
//! This crate holds the plain data exchanged between the session core and
//! the collaborators around it: identifiers and correlation tokens,
//! positions, vessels, derived navigation data and decoded telemetry
//! messages. It contains no I/O and no async code.
//!
//! # Modules
//!
//! - [`ids`] -- Server identifiers and correlation tokens
//! - [`enums`] -- Session mode, bearing reference, heading attribute, direction
//! - [`position`] -- `[lon, lat]` positions
//! - [`vessel`] -- Own ship and AIS target records
//! - [`navigation`] -- Derived navigation data
//! - [`delta`] -- Decoded `hello` and `update` messages
//! - [`server`] -- Discovery info, playback queries, credentials

pub mod delta;
pub mod enums;
pub mod ids;
pub mod navigation;
pub mod position;
pub mod server;
pub mod vessel;

// Re-export all public types at crate root for convenience.
pub use delta::{Delta, Hello, PathValue, Update};
pub use enums::{BearingType, Direction, HeadingAttribute, SessionMode};
pub use ids::{Generation, LoadTicket, ModalTicket, RequestId, RouteId, TimerId, VesselId};
pub use navigation::{Bearing, NavigationData};
pub use position::Position;
pub use server::{Credentials, PlaybackQuery, ServerInfo};
pub use vessel::{Vessel, Wind};
