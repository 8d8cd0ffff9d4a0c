// Wire shapes of the legacy endpoints the bridge reads.
//
// Only the fields the bridge consumes are modelled; serde ignores the rest.
// Nearly everything is optional because firmware versions disagree on
// which keys they send.

use serde::Deserialize;

/// `{ "meta": { "rc": "ok", "msg": ... }, "data": [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

/// UniFi OS reports some failures as HTTP 200 with this body instead of
/// an envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ConsoleError {
    pub error: ConsoleErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConsoleErrorDetail {
    pub code: u16,
    #[serde(default)]
    pub message: Option<String>,
}

/// One associated station from `stat/sta`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyClientEntry {
    pub mac: String,
    /// User-assigned alias.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub ap_mac: Option<String>,
    #[serde(default)]
    pub channel: Option<i32>,
    #[serde(default)]
    pub essid: Option<String>,
}

/// One adopted device from `stat/device`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDevice {
    pub mac: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `uap`, `usw`, `udm`, ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// One site from `self/sites`. `name` is the short id used in URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacySite {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
}
