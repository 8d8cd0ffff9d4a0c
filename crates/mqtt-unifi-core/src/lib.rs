//! Station tracking between `mqtt-unifi-api` and a publish/subscribe bus.
//!
//! - **[`Registry`]**: the current station map behind an `ArcSwap`.
//!   Lookups never block; [`replace()`](Registry::replace) installs a new
//!   map atomically and returns the presence [`StationDiff`].
//!
//! - **[`PollLoop`]**: fetches a [`ControllerReport`] from a
//!   [`StationSource`] on a fixed interval and emits `new` / `delete` events
//!   through the [`Publisher`]. Failed fetches leave the registry untouched.
//!
//! - **[`QueryResponder`]**: answers `<ns>/get/host/<mac>` with
//!   `<ns>/status/host/<mac>`, using an identifier-only snapshot for unknown
//!   stations.
//!
//! - **[`Bridge`]**: subscribes, spawns both activities, and stops them on
//!   [`BridgeHandle::shutdown()`].
//!
//! - **[`Controller`]**: the legacy-API session that implements
//!   [`StationSource`], renewing expired logins on the fly.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod controller;
pub mod convert;
pub mod diff;
pub mod error;
pub mod model;
pub mod poll;
pub mod publisher;
pub mod registry;
pub mod responder;
pub mod source;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeHandle};
pub use bus::{Bus, InboundMessage};
pub use config::{BridgeConfig, BusConfig, ControllerConfig, PlatformSelection, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use diff::{Roam, StationDiff, diff, roams};
pub use error::{BusError, CoreError};
pub use model::{AccessPointTable, ControllerReport, MacAddress, RawStation, StationMap, StationSnapshot};
pub use poll::{CycleOutcome, PollLoop};
pub use publisher::{Publisher, Topics, encode_payload};
pub use registry::{Registry, Transition};
pub use responder::QueryResponder;
pub use source::StationSource;
