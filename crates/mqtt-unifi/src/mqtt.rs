// ── MQTT adapter ──
//
// Implements the core `Bus` trait on rumqttc. The event loop runs on its
// own task: inbound publishes go to the bridge's channel, connection errors
// go to the orchestrator, and subscriptions are replayed after every
// reconnect. Nothing here exits the process.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mqtt_unifi_core::{Bus, BusConfig, BusError, InboundMessage};

const REQUEST_CHANNEL_CAPACITY: usize = 64;
const INBOUND_CHANNEL_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Publishing side of the broker connection.
pub struct MqttBus {
    client: AsyncClient,
    filters: Arc<Mutex<Vec<String>>>,
}

/// A live broker connection and the channels fed by its event loop.
pub struct MqttConnection {
    pub bus: Arc<MqttBus>,
    pub inbound: mpsc::Receiver<InboundMessage>,
    pub errors: mpsc::UnboundedReceiver<BusError>,
    pub event_loop: JoinHandle<()>,
}

/// Connect to the broker and wait for its CONNACK.
///
/// Failing to connect here is fatal; later connection losses are reported
/// on `errors` while the event loop keeps reconnecting.
pub async fn connect(
    config: &BusConfig,
    cancel: CancellationToken,
) -> Result<MqttConnection, BusError> {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(config.keep_alive);
    options.set_clean_session(true);
    if let Some((login, password)) = &config.credentials {
        options.set_credentials(login, password.expose_secret());
    }

    let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code != ConnectReturnCode::Success {
                    return Err(BusError::Connect(format!("broker refused: {:?}", ack.code)));
                }
                info!(host = %config.host, port = config.port, "connected to broker");
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(BusError::Connect(e.to_string())),
        }
    }

    let filters = Arc::new(Mutex::new(Vec::new()));
    let (inbound_tx, inbound) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
    let (error_tx, errors) = mpsc::unbounded_channel();

    let event_loop = tokio::spawn(drive(
        event_loop,
        client.clone(),
        Arc::clone(&filters),
        inbound_tx,
        error_tx,
        cancel,
    ));

    Ok(MqttConnection {
        bus: Arc::new(MqttBus { client, filters }),
        inbound,
        errors,
        event_loop,
    })
}

impl MqttBus {
    /// Queue a DISCONNECT; the event loop exits once it has been sent.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "disconnect request not delivered");
        }
    }
}

impl Bus for MqttBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        // Fire-and-forget: never wait on a full request queue.
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| BusError::Publish {
                topic: topic.to_owned(),
                reason: e.to_string(),
            })
    }

    async fn subscribe(&self, filter: &str) -> Result<(), BusError> {
        self.client
            .subscribe(filter, QoS::AtMostOnce)
            .await
            .map_err(|e| BusError::Subscribe {
                filter: filter.to_owned(),
                reason: e.to_string(),
            })?;
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filter.to_owned());
        Ok(())
    }
}

/// What the event loop does after one poll result.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    /// The broker accepted a (re)connect; replay these filters.
    Resubscribe(Vec<String>),
    /// Connection error, already reported. Wait before polling again.
    Backoff,
    Stop,
}

async fn drive(
    mut event_loop: EventLoop,
    client: AsyncClient,
    filters: Arc<Mutex<Vec<String>>>,
    inbound: mpsc::Sender<InboundMessage>,
    errors: mpsc::UnboundedSender<BusError>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = event_loop.poll() => event,
        };

        match dispatch(event, &filters, &inbound, &errors).await {
            Step::Continue => {}
            Step::Resubscribe(filters) => {
                for filter in filters {
                    if let Err(e) = client.try_subscribe(&filter, QoS::AtMostOnce) {
                        warn!(filter = %filter, error = %e, "resubscribe failed");
                    }
                }
            }
            Step::Backoff => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
            Step::Stop => break,
        }
    }

    debug!("broker event loop stopped");
}

async fn dispatch(
    event: Result<Event, ConnectionError>,
    filters: &Mutex<Vec<String>>,
    inbound: &mpsc::Sender<InboundMessage>,
    errors: &mpsc::UnboundedSender<BusError>,
) -> Step {
    match event {
        Ok(Event::Incoming(Packet::Publish(publish))) => {
            let message = InboundMessage {
                topic: publish.topic,
                payload: publish.payload,
            };
            if inbound.send(message).await.is_err() {
                debug!("inbound receiver dropped");
            }
            Step::Continue
        }
        Ok(Event::Incoming(Packet::ConnAck(_))) => {
            info!("reconnected to broker");
            Step::Resubscribe(
                filters
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            )
        }
        Ok(Event::Outgoing(Outgoing::Disconnect)) => {
            debug!("disconnect sent");
            Step::Stop
        }
        Ok(_) => Step::Continue,
        Err(e) => {
            let _ = errors.send(BusError::Connect(e.to_string()));
            Step::Backoff
        }
    }
}
