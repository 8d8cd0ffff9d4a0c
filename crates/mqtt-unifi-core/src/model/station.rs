// ── Station domain types ──

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::StationMap;
use super::mac::MacAddress;

/// One associated station as published on the bus.
///
/// Field order is the wire layout: `{mac,name,ip,ap,channel,essid}`.
/// Missing values are empty strings (or channel `0`), never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSnapshot {
    #[serde(rename = "mac")]
    pub id: MacAddress,
    pub name: String,
    #[serde(rename = "ip")]
    pub address: String,
    #[serde(rename = "ap")]
    pub access_point: String,
    pub channel: u32,
    #[serde(rename = "essid")]
    pub ssid: String,
}

impl StationSnapshot {
    /// Reply for a station the registry has never seen: identifier only.
    pub fn unknown(id: MacAddress) -> Self {
        Self {
            id,
            name: String::new(),
            address: String::new(),
            access_point: String::new(),
            channel: 0,
            ssid: String::new(),
        }
    }

    /// Build a snapshot from a controller record, resolving the AP name.
    pub fn from_raw(raw: RawStation, access_points: &AccessPointTable) -> Self {
        let id = raw.mac;
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .or(raw.hostname.filter(|h| !h.is_empty()))
            .unwrap_or_else(|| id.to_string());
        let access_point = raw
            .ap_mac
            .and_then(|ap| access_points.get(&ap).cloned())
            .unwrap_or_default();

        Self {
            id,
            name,
            address: raw.ip.unwrap_or_default(),
            access_point,
            channel: raw.channel.unwrap_or(0),
            ssid: raw.essid.unwrap_or_default(),
        }
    }
}

/// A station as reported by the controller, before AP name resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStation {
    pub mac: MacAddress,
    /// User-assigned alias in the controller UI.
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub ap_mac: Option<MacAddress>,
    pub channel: Option<u32>,
    pub essid: Option<String>,
}

/// Access-point MAC to display name.
pub type AccessPointTable = HashMap<MacAddress, String>;

/// Everything one poll cycle fetched from the controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerReport {
    pub stations: Vec<RawStation>,
    pub access_points: AccessPointTable,
}

impl ControllerReport {
    /// Build the snapshot map for this report.
    ///
    /// Duplicate station records collapse onto one key; the last one wins.
    pub fn into_station_map(self) -> StationMap {
        let Self {
            stations,
            access_points,
        } = self;

        stations
            .into_iter()
            .filter(|raw| !raw.mac.is_empty())
            .map(|raw| {
                let snapshot = StationSnapshot::from_raw(raw, &access_points);
                (snapshot.id.clone(), snapshot)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(mac: &str) -> RawStation {
        RawStation {
            mac: MacAddress::new(mac),
            ..RawStation::default()
        }
    }

    #[test]
    fn name_prefers_alias_then_hostname_then_mac() {
        let aps = AccessPointTable::new();

        let aliased = RawStation {
            name: Some("Kitchen tablet".into()),
            hostname: Some("android-1234".into()),
            ..raw("aa:bb:cc:00:00:01")
        };
        assert_eq!(StationSnapshot::from_raw(aliased, &aps).name, "Kitchen tablet");

        let hostname_only = RawStation {
            name: Some(String::new()),
            hostname: Some("android-1234".into()),
            ..raw("aa:bb:cc:00:00:02")
        };
        assert_eq!(StationSnapshot::from_raw(hostname_only, &aps).name, "android-1234");

        let anonymous = raw("AA:BB:CC:00:00:03");
        assert_eq!(
            StationSnapshot::from_raw(anonymous, &aps).name,
            "aa:bb:cc:00:00:03"
        );
    }

    #[test]
    fn access_point_name_is_resolved_by_normalized_mac() {
        let mut aps = AccessPointTable::new();
        aps.insert(MacAddress::new("f0:9f:c2:00:00:01"), "Hallway".into());

        let station = RawStation {
            ap_mac: Some(MacAddress::new("F0-9F-C2-00-00-01")),
            channel: Some(11),
            essid: Some("HomeNet".into()),
            ip: Some("192.168.1.5".into()),
            ..raw("aa:bb:cc:00:00:01")
        };
        let snap = StationSnapshot::from_raw(station, &aps);
        assert_eq!(snap.access_point, "Hallway");
        assert_eq!(snap.channel, 11);
        assert_eq!(snap.ssid, "HomeNet");
        assert_eq!(snap.address, "192.168.1.5");
    }

    #[test]
    fn unknown_access_point_is_empty() {
        let station = RawStation {
            ap_mac: Some(MacAddress::new("f0:9f:c2:00:00:99")),
            ..raw("aa:bb:cc:00:00:01")
        };
        let snap = StationSnapshot::from_raw(station, &AccessPointTable::new());
        assert_eq!(snap.access_point, "");
        assert_eq!(snap.address, "");
        assert_eq!(snap.channel, 0);
    }

    #[test]
    fn report_keys_are_unique_and_normalized() {
        let report = ControllerReport {
            stations: vec![
                raw("AA:BB:CC:00:00:01"),
                RawStation {
                    hostname: Some("second".into()),
                    ..raw("aa-bb-cc-00-00-01")
                },
                raw(""),
            ],
            access_points: AccessPointTable::new(),
        };

        let map = report.into_station_map();
        assert_eq!(map.len(), 1);
        let snap = map.get(&MacAddress::new("aa:bb:cc:00:00:01")).unwrap();
        assert_eq!(snap.name, "second");
    }

    #[test]
    fn unknown_snapshot_has_only_the_identifier() {
        let snap = StationSnapshot::unknown(MacAddress::new("aa:bb:cc:dd:ee:ff"));
        assert_eq!(snap.id.as_str(), "aa:bb:cc:dd:ee:ff");
        assert!(snap.name.is_empty() && snap.address.is_empty());
        assert!(snap.access_point.is_empty() && snap.ssid.is_empty());
        assert_eq!(snap.channel, 0);
    }
}
