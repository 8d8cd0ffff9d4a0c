// ── Presence diff ──
//
// Pure comparison of two consecutive snapshot maps. Only presence
// transitions are events; attribute changes on a station that stays
// associated are surfaced separately by `roams` for logging.

use std::collections::BTreeSet;

use crate::model::{MacAddress, StationMap, StationSnapshot};

/// Presence transitions between two snapshot maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationDiff {
    /// Present in the new map, absent from the old one.
    pub appeared: BTreeSet<MacAddress>,
    /// Present in the old map, absent from the new one.
    pub vanished: BTreeSet<MacAddress>,
}

impl StationDiff {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.vanished.is_empty()
    }
}

/// Compute which stations appeared and which vanished between `old` and `new`.
pub fn diff(old: &StationMap, new: &StationMap) -> StationDiff {
    StationDiff {
        appeared: new
            .keys()
            .filter(|id| !old.contains_key(*id))
            .cloned()
            .collect(),
        vanished: old
            .keys()
            .filter(|id| !new.contains_key(*id))
            .cloned()
            .collect(),
    }
}

/// A station present in both maps whose attributes changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roam<'a> {
    pub before: &'a StationSnapshot,
    pub after: &'a StationSnapshot,
}

/// Stations that stayed associated but moved AP, channel, SSID, name, or address.
pub fn roams<'a>(old: &'a StationMap, new: &'a StationMap) -> impl Iterator<Item = Roam<'a>> {
    new.iter().filter_map(move |(id, after)| {
        old.get(id)
            .filter(|before| *before != after)
            .map(|before| Roam { before, after })
    })
}
