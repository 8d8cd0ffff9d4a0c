// ── Publisher ──
//
// Topic layout and payload encoding for everything the bridge emits.
//
//   <ns>/new/host/<id>      station appeared
//   <ns>/delete/host/<id>   station vanished (last known snapshot)
//   <ns>/status/host/<id>   reply to <ns>/get/host/<id>

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bus::Bus;
use crate::model::{MacAddress, StationSnapshot};

/// Topic names under one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    namespace: String,
}

impl Topics {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        Self {
            namespace: namespace.trim_end_matches('/').to_owned(),
        }
    }

    pub fn new_host(&self, id: &MacAddress) -> String {
        format!("{}/new/host/{id}", self.namespace)
    }

    pub fn delete_host(&self, id: &MacAddress) -> String {
        format!("{}/delete/host/{id}", self.namespace)
    }

    pub fn status_host(&self, id: &MacAddress) -> String {
        format!("{}/status/host/{id}", self.namespace)
    }

    /// Subscription filter for status queries.
    pub fn get_filter(&self) -> String {
        format!("{}/get/host/+", self.namespace)
    }

    /// Extract the normalized station identifier from a query topic.
    ///
    /// Returns `None` for topics outside `<ns>/get/host/` or with an empty
    /// or multi-level remainder.
    pub fn parse_get(&self, topic: &str) -> Option<MacAddress> {
        let rest = topic
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix("/get/host/")?;
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        let id = MacAddress::new(rest);
        (!id.is_empty()).then_some(id)
    }
}

/// Serialize a snapshot to the wire payload: compact JSON, no trailing newline.
pub fn encode_payload(snapshot: &StationSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Best-effort emitter of station events.
pub struct Publisher<B> {
    bus: Arc<B>,
    topics: Topics,
}

impl<B> Clone for Publisher<B> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            topics: self.topics.clone(),
        }
    }
}

impl<B: Bus> Publisher<B> {
    pub fn new(bus: Arc<B>, topics: Topics) -> Self {
        Self { bus, topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub async fn appeared(&self, snapshot: &StationSnapshot) -> bool {
        self.emit(self.topics.new_host(&snapshot.id), snapshot).await
    }

    pub async fn vanished(&self, snapshot: &StationSnapshot) -> bool {
        self.emit(self.topics.delete_host(&snapshot.id), snapshot)
            .await
    }

    pub async fn status(&self, snapshot: &StationSnapshot) -> bool {
        self.emit(self.topics.status_host(&snapshot.id), snapshot)
            .await
    }

    /// Publish one snapshot. Failures are logged and dropped; returns
    /// whether the bus accepted the message.
    async fn emit(&self, topic: String, snapshot: &StationSnapshot) -> bool {
        let payload = match encode_payload(snapshot) {
            Ok(p) => p,
            Err(e) => {
                warn!(topic = %topic, error = %e, "failed to encode station payload");
                return false;
            }
        };

        match self.bus.publish(&topic, payload).await {
            Ok(()) => {
                debug!(topic = %topic, "published");
                true
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "publish failed, message dropped");
                false
            }
        }
    }
}
