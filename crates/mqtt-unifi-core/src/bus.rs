// ── Messaging-bus contract ──
//
// The core publishes and subscribes through this trait only. Connection
// management, wire encoding, and QoS live in the adapter that implements it.

use std::future::Future;

use bytes::Bytes;

use crate::error::BusError;

/// A message delivered by the bus for one of our subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// Publish/subscribe transport.
///
/// Publishes are at-most-once from the core's point of view: a returned
/// error is logged by the caller and the message is dropped.
pub trait Bus: Send + Sync + 'static {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    /// Register interest in `filter`. Matching messages arrive on the
    /// inbound channel handed to the bridge.
    fn subscribe(&self, filter: &str) -> impl Future<Output = Result<(), BusError>> + Send;
}
