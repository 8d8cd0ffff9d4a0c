// Legacy controller API
//
// The `/api/...` surface every controller generation still serves, behind
// a cookie session. The bridge needs only login, site lookup, stations and
// devices from it.

pub mod client;
pub mod models;
pub mod session;
pub mod stat;

pub use client::LegacyClient;
