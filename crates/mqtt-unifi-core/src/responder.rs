// ── Query responder ──
//
// Answers `<ns>/get/host/<id>` with `<ns>/status/host/<id>`. Lookups go
// straight to the registry's current map and never wait on a poll cycle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bus::{Bus, InboundMessage};
use crate::model::StationSnapshot;
use crate::publisher::Publisher;
use crate::registry::Registry;

pub struct QueryResponder<B> {
    registry: Arc<Registry>,
    publisher: Publisher<B>,
}

impl<B: Bus> QueryResponder<B> {
    pub fn new(registry: Arc<Registry>, publisher: Publisher<B>) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    /// Answer one inbound query topic.
    ///
    /// Unknown stations are answered with an identifier-only snapshot.
    /// Returns `None` when the topic is not a query at all.
    pub async fn answer(&self, topic: &str) -> Option<StationSnapshot> {
        let Some(id) = self.publisher.topics().parse_get(topic) else {
            debug!(topic, "ignoring message outside the query topic");
            return None;
        };

        let snapshot = match self.registry.snapshot(&id) {
            Some(snapshot) => snapshot,
            None => {
                debug!(mac = %id, "query for unknown station");
                StationSnapshot::unknown(id)
            }
        };

        self.publisher.status(&snapshot).await;
        Some(snapshot)
    }

    /// Serve queries until `cancel` fires or the inbound channel closes.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundMessage>, cancel: CancellationToken) {
        info!("query responder started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                message = inbound.recv() => {
                    let Some(message) = message else {
                        debug!("inbound channel closed");
                        break;
                    };
                    self.answer(&message.topic).await;
                }
            }
        }

        info!("query responder stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{MacAddress, StationMap};
    use crate::publisher::Topics;
    use crate::testing::RecordingBus;
    use bytes::Bytes;

    fn setup() -> (QueryResponder<RecordingBus>, Arc<Registry>, Arc<RecordingBus>) {
        let bus = Arc::new(RecordingBus::default());
        let registry = Arc::new(Registry::new());
        let publisher = Publisher::new(Arc::clone(&bus), Topics::new("mqtt-unifi"));
        (
            QueryResponder::new(Arc::clone(&registry), publisher),
            registry,
            bus,
        )
    }

    fn known(mac: &str) -> StationMap {
        let snapshot = StationSnapshot {
            name: "laptop".into(),
            address: "10.0.0.5".into(),
            access_point: "Hall".into(),
            channel: 11,
            ssid: "HomeNet".into(),
            ..StationSnapshot::unknown(MacAddress::new(mac))
        };
        StationMap::from([(snapshot.id.clone(), snapshot)])
    }

    #[tokio::test]
    async fn known_station_is_answered_from_registry() {
        let (responder, registry, bus) = setup();
        registry.replace(known("aa:bb:cc:dd:ee:ff"));

        let reply = responder
            .answer("mqtt-unifi/get/host/aa:bb:cc:dd:ee:ff")
            .await
            .unwrap();
        assert_eq!(reply.name, "laptop");

        let sent = bus.published();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "mqtt-unifi/status/host/aa:bb:cc:dd:ee:ff");
        assert!(sent[0].1.contains(r#""ap":"Hall""#));
    }

    #[tokio::test]
    async fn identifier_case_and_separators_do_not_matter() {
        let (responder, registry, _bus) = setup();
        registry.replace(known("aa:bb:cc:dd:ee:ff"));

        let upper = responder
            .answer("mqtt-unifi/get/host/AA:BB:CC:DD:EE:FF")
            .await
            .unwrap();
        let lower = responder
            .answer("mqtt-unifi/get/host/aa:bb:cc:dd:ee:ff")
            .await
            .unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.name, "laptop");
    }

    #[tokio::test]
    async fn unknown_station_gets_identifier_only_reply() {
        let (responder, _registry, bus) = setup();

        let reply = responder
            .answer("mqtt-unifi/get/host/AA-BB-CC-00-00-01")
            .await
            .unwrap();
        assert_eq!(reply, StationSnapshot::unknown(MacAddress::new("aa:bb:cc:00:00:01")));

        let sent = bus.published();
        assert_eq!(sent[0].0, "mqtt-unifi/status/host/aa:bb:cc:00:00:01");
        assert_eq!(
            sent[0].1,
            r#"{"mac":"aa:bb:cc:00:00:01","name":"","ip":"","ap":"","channel":0,"essid":""}"#
        );
    }

    #[tokio::test]
    async fn foreign_topics_are_ignored() {
        let (responder, _registry, bus) = setup();
        assert!(responder.answer("mqtt-unifi/new/host/aa").await.is_none());
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn run_stops_when_channel_closes() {
        let (responder, _registry, bus) = setup();
        let (tx, rx) = mpsc::channel(4);

        tx.send(InboundMessage {
            topic: "mqtt-unifi/get/host/aa:bb:cc:00:00:02".into(),
            payload: Bytes::new(),
        })
        .await
        .unwrap();
        drop(tx);

        responder.run(rx, CancellationToken::new()).await;
        assert_eq!(bus.published().len(), 1);
    }
}
