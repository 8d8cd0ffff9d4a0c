// ── Poll loop ──
//
// Timer-driven refresh: fetch from the station source, swap the registry,
// and emit one event per presence transition. Cycles run back to back on
// a single task, so `Registry::replace` never races with itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::Bus;
use crate::diff::{StationDiff, roams};
use crate::publisher::Publisher;
use crate::registry::Registry;
use crate::source::StationSource;

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Registry replaced; events emitted for this diff.
    Applied(StationDiff),
    /// Fetch failed; registry untouched.
    Skipped,
    /// Cancelled while fetching; registry untouched.
    Abandoned,
}

pub struct PollLoop<S, B> {
    source: Arc<S>,
    registry: Arc<Registry>,
    publisher: Publisher<B>,
    interval: Duration,
}

impl<S: StationSource, B: Bus> PollLoop<S, B> {
    pub fn new(
        source: Arc<S>,
        registry: Arc<Registry>,
        publisher: Publisher<B>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            publisher,
            interval,
        }
    }

    /// Run one fetch / replace / publish cycle.
    ///
    /// Cancellation is honoured only while the fetch is in flight. Once the
    /// registry has been replaced the cycle always publishes its events.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleOutcome {
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("poll cycle abandoned during fetch");
                return CycleOutcome::Abandoned;
            }
            result = self.source.fetch() => result,
        };

        let report = match fetched {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "controller fetch failed, keeping previous stations");
                return CycleOutcome::Skipped;
            }
        };

        let transition = self.registry.replace(report.into_station_map());

        for roam in roams(&transition.previous, &transition.current) {
            debug!(
                mac = %roam.after.id,
                from_ap = %roam.before.access_point,
                to_ap = %roam.after.access_point,
                from_channel = roam.before.channel,
                to_channel = roam.after.channel,
                essid = %roam.after.ssid,
                ip = %roam.after.address,
                "station roamed"
            );
        }

        for id in &transition.diff.appeared {
            if let Some(snapshot) = transition.current.get(id) {
                debug!(mac = %id, name = %snapshot.name, ap = %snapshot.access_point, "station appeared");
                self.publisher.appeared(snapshot).await;
            }
        }

        for id in &transition.diff.vanished {
            if let Some(snapshot) = transition.previous.get(id) {
                debug!(mac = %id, name = %snapshot.name, "station vanished");
                self.publisher.vanished(snapshot).await;
            }
        }

        CycleOutcome::Applied(transition.diff)
    }

    /// Poll until `cancel` fires. The first cycle runs immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.interval, "poll loop started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.run_cycle(&cancel).await == CycleOutcome::Abandoned {
                        break;
                    }
                }
            }
        }

        info!(stations = self.registry.len(), "poll loop stopped");
    }
}
