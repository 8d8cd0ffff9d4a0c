// ── Station registry ──
//
// The single piece of shared mutable state. Readers load the current
// map through `ArcSwap` and never block; `replace` installs a whole new
// map in one atomic swap, so a reader sees either the old or the new
// map and never a mix of both.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::diff::{StationDiff, diff};
use crate::model::{MacAddress, StationMap, StationSnapshot};

/// Result of a `Registry::replace`: the transitions plus both maps.
///
/// `previous` holds the last known snapshot of every vanished station.
#[derive(Debug, Clone)]
pub struct Transition {
    pub diff: StationDiff,
    pub previous: Arc<StationMap>,
    pub current: Arc<StationMap>,
}

/// Current set of associated stations, shared by the poll loop and the
/// query responder.
///
/// Starts empty; the first successful poll therefore reports every present
/// station as appeared.
pub struct Registry {
    current: ArcSwap<StationMap>,
    /// Serializes writers. Readers never touch it.
    writer: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(StationMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Look up one station by (already normalized) identifier.
    pub fn snapshot(&self, id: &MacAddress) -> Option<StationSnapshot> {
        self.current.load().get(id).cloned()
    }

    /// The full current map (cheap `Arc` clone).
    pub fn current(&self) -> Arc<StationMap> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Atomically install `next` and report transitions against the map it replaced.
    pub fn replace(&self, next: StationMap) -> Transition {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = Arc::new(next);
        let previous = self.current.swap(Arc::clone(&current));
        let diff = diff(&previous, &current);

        Transition {
            diff,
            previous,
            current,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn station(mac: &str, ap: &str) -> StationSnapshot {
        StationSnapshot {
            name: format!("host-{mac}"),
            access_point: ap.into(),
            ..StationSnapshot::unknown(MacAddress::new(mac))
        }
    }

    fn map(stations: &[StationSnapshot]) -> StationMap {
        stations.iter().map(|s| (s.id.clone(), s.clone())).collect()
    }

    #[test]
    fn starts_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.snapshot(&MacAddress::new("aa:00:00:00:00:01")).is_none());
    }

    #[test]
    fn replace_makes_entries_visible() {
        let registry = Registry::new();
        let m = map(&[station("aa:00:00:00:00:01", "Hall"), station("aa:00:00:00:00:02", "Hall")]);

        registry.replace(m.clone());

        for (id, snap) in &m {
            assert_eq!(registry.snapshot(id).as_ref(), Some(snap));
        }
        assert!(registry.snapshot(&MacAddress::new("aa:00:00:00:00:03")).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_replace_reports_all_appeared() {
        let registry = Registry::new();
        let t = registry.replace(map(&[station("aa:00:00:00:00:01", "Hall")]));

        assert_eq!(
            t.diff.appeared,
            BTreeSet::from([MacAddress::new("aa:00:00:00:00:01")])
        );
        assert!(t.diff.vanished.is_empty());
        assert!(t.previous.is_empty());
    }

    #[test]
    fn replace_keeps_last_known_snapshot_of_vanished() {
        let registry = Registry::new();
        registry.replace(map(&[station("aa:00:00:00:00:01", "Hall"), station("aa:00:00:00:00:02", "Hall")]));

        let t = registry.replace(map(&[
            station("aa:00:00:00:00:02", "Office"),
            station("aa:00:00:00:00:03", "Office"),
        ]));

        let a = MacAddress::new("aa:00:00:00:00:01");
        assert_eq!(t.diff.appeared, BTreeSet::from([MacAddress::new("aa:00:00:00:00:03")]));
        assert_eq!(t.diff.vanished, BTreeSet::from([a.clone()]));
        assert_eq!(t.previous.get(&a).unwrap().access_point, "Hall");
        assert!(registry.snapshot(&a).is_none());
        assert_eq!(
            registry
                .snapshot(&MacAddress::new("aa:00:00:00:00:02"))
                .unwrap()
                .access_point,
            "Office"
        );
    }

    #[test]
    fn readers_see_whole_maps_during_concurrent_replaces() {
        let registry = Arc::new(Registry::new());
        let even = map(&[station("aa:00:00:00:00:01", "A"), station("aa:00:00:00:00:02", "A")]);
        let odd = map(&[station("aa:00:00:00:00:01", "B"), station("aa:00:00:00:00:02", "B")]);

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..500 {
                    registry.replace(if i % 2 == 0 { even.clone() } else { odd.clone() });
                }
            })
        };

        for _ in 0..500 {
            let snapshot = registry.current();
            let aps: BTreeSet<_> = snapshot.values().map(|s| s.access_point.clone()).collect();
            assert!(aps.len() <= 1, "observed a partially updated map: {aps:?}");
        }

        writer.join().unwrap();
        assert_eq!(registry.len(), 2);
    }
}
