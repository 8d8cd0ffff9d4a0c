// ── Station identity ──
//
// MacAddress is the registry key and the `<id>` segment of every topic.
// Controller records and inbound topics both pass through `MacAddress::new`,
// so lookups ignore case and separator style.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Station identifier in canonical form: lowercase, colon-separated.
///
/// Strings that are not MAC-shaped are kept (lowercased) rather than
/// rejected; the controller is the authority on what a station id is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(canonical(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `AA-BB-CC-DD-EE-FF`, `AABBCCDDEEFF` and `aa:bb:cc:dd:ee:ff` all map to
/// the last form.
fn canonical(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase().replace('-', ":");

    let bare_hex = lowered.len() == 12 && lowered.bytes().all(|b| b.is_ascii_hexdigit());
    if !bare_hex {
        return lowered;
    }

    lowered
        .as_bytes()
        .chunks(2)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(":")
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for MacAddress {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for MacAddress {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<MacAddress> for String {
    fn from(id: MacAddress) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_spelling_maps_to_one_key() {
        let spellings = [
            "aa:bb:cc:dd:ee:ff",
            "AA:BB:CC:DD:EE:FF",
            "AA-BB-CC-DD-EE-FF",
            "AABBCCDDEEFF",
            " aa:bb:cc:dd:ee:ff\n",
        ];
        for raw in spellings {
            assert_eq!(MacAddress::new(raw).as_str(), "aa:bb:cc:dd:ee:ff", "{raw:?}");
        }
    }

    #[test]
    fn non_mac_strings_are_only_lowercased() {
        assert_eq!(MacAddress::new("Printer").as_str(), "printer");
        assert_eq!(MacAddress::new("abc").as_str(), "abc");
        assert!(MacAddress::new("  ").is_empty());
    }

    #[test]
    fn parse_and_display() {
        let mac: MacAddress = "00-11-22-AA-BB-CC".parse().unwrap();
        assert_eq!(mac.to_string(), "00:11:22:aa:bb:cc");
    }

    #[test]
    fn serde_normalizes_on_the_way_in() {
        let mac: MacAddress = serde_json::from_str("\"AABBCCDDEEFF\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"aa:bb:cc:dd:ee:ff\"");
    }
}
