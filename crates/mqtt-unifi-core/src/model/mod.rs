// ── Domain model ──
//
// Station identity and per-poll snapshots. Everything the bridge
// publishes or stores is expressed in these types.

pub mod mac;
pub mod station;

use std::collections::BTreeMap;

pub use mac::MacAddress;
pub use station::{AccessPointTable, ControllerReport, RawStation, StationSnapshot};

/// Every associated station at one poll instant, keyed by normalized MAC.
///
/// Ordered so that event emission and log output are deterministic.
pub type StationMap = BTreeMap<MacAddress, StationSnapshot>;
