// ── API-to-domain type conversions ──
//
// Bridges raw `mqtt-unifi-api` response types into the station model.
// Normalization happens here so nothing downstream sees raw MACs.

use mqtt_unifi_api::{LegacyClientEntry, LegacyDevice};

use crate::model::{AccessPointTable, MacAddress, RawStation};

/// Treat empty strings from the controller the same as missing fields.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

impl From<LegacyClientEntry> for RawStation {
    fn from(c: LegacyClientEntry) -> Self {
        RawStation {
            mac: MacAddress::new(&c.mac),
            name: non_empty(c.name),
            hostname: non_empty(c.hostname),
            ip: non_empty(c.ip),
            ap_mac: non_empty(c.ap_mac).map(MacAddress::new),
            channel: c.channel.and_then(|ch| u32::try_from(ch).ok()),
            essid: non_empty(c.essid),
        }
    }
}

/// Build the AP name table from the device list.
///
/// Every device is included, not just `uap`: consoles with built-in radios
/// (UDM, UX) report stations attached to themselves. Unnamed devices fall
/// back to their MAC.
pub fn access_point_table(devices: Vec<LegacyDevice>) -> AccessPointTable {
    devices
        .into_iter()
        .map(|d| {
            let mac = MacAddress::new(&d.mac);
            let name = non_empty(d.name).unwrap_or_else(|| mac.to_string());
            (mac, name)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> LegacyClientEntry {
        serde_json::from_value(value).unwrap()
    }

    fn device(value: serde_json::Value) -> LegacyDevice {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn legacy_station_is_normalized() {
        let raw = RawStation::from(entry(json!({
            "_id": "1",
            "mac": "AA:BB:CC:DD:EE:FF",
            "hostname": "laptop",
            "name": "",
            "ip": "10.0.0.7",
            "ap_mac": "F0:9F:C2:00:00:01",
            "channel": 149,
            "essid": "HomeNet"
        })));

        assert_eq!(raw.mac.as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(raw.name, None);
        assert_eq!(raw.hostname.as_deref(), Some("laptop"));
        assert_eq!(raw.ap_mac.unwrap().as_str(), "f0:9f:c2:00:00:01");
        assert_eq!(raw.channel, Some(149));
    }

    #[test]
    fn negative_channel_is_dropped() {
        let raw = RawStation::from(entry(json!({ "mac": "aa:bb:cc:dd:ee:ff", "channel": -1 })));
        assert_eq!(raw.channel, None);
    }

    #[test]
    fn access_point_table_falls_back_to_mac() {
        let table = access_point_table(vec![
            device(json!({ "mac": "F0:9F:C2:00:00:01", "type": "uap", "name": "Office" })),
            device(json!({ "mac": "f0:9f:c2:00:00:02", "type": "udm" })),
        ]);

        assert_eq!(table[&MacAddress::new("f0:9f:c2:00:00:01")], "Office");
        assert_eq!(
            table[&MacAddress::new("f0:9f:c2:00:00:02")],
            "f0:9f:c2:00:00:02"
        );
    }
}
