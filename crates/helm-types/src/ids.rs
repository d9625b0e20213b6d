//! Type-safe identifier wrappers.
//!
//! Two families of identifiers exist in the session core:
//!
//! - **Server identifiers** ([`VesselId`], [`RouteId`]) are opaque strings
//!   handed out by the telemetry server. They are wrapped so a route id can
//!   never be passed where a vessel context is expected.
//! - **Correlation tokens** ([`RequestId`], [`Generation`], [`ModalTicket`],
//!   [`LoadTicket`], [`TimerId`]) are monotonically increasing counters the
//!   core hands out when it issues an asynchronous request. Completions carry
//!   the token back so stale or unknown completions can be dropped.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a server-assigned [`String`] id.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a monotonically increasing correlation token.
macro_rules! define_token {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Return the token that follows this one.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }

            /// Return the raw counter value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Context identifier of a vessel, e.g. `vessels.urn:mrn:imo:mmsi:123456789`.
    VesselId
}

define_id! {
    /// Identifier of a route held by the resource store.
    RouteId
}

define_token! {
    /// Correlates a request-interface call with its response.
    RequestId
}

define_token! {
    /// Active-vessel switch generation. Bumped on every switch; route and
    /// alarm responses tagged with an older generation are stale.
    Generation
}

define_token! {
    /// Correlates a presented modal with the result it eventually yields.
    ModalTicket
}

define_token! {
    /// Correlates a trail load with its completion.
    LoadTicket
}

define_token! {
    /// Identifies a timer started through the scheduler port.
    TimerId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_advance_monotonically() {
        let g = Generation::default();
        assert_eq!(g.next(), Generation(1));
        assert!(g.next().next() > g.next());
    }

    #[test]
    fn tokens_saturate_instead_of_wrapping() {
        assert_eq!(RequestId(u64::MAX).next(), RequestId(u64::MAX));
    }

    #[test]
    fn vessel_id_serializes_as_plain_string() {
        let id = VesselId::new("vessels.urn:mrn:imo:mmsi:123");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"vessels.urn:mrn:imo:mmsi:123\"");
        assert_eq!(id.to_string(), "vessels.urn:mrn:imo:mmsi:123");
    }
}
