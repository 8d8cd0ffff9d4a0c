// ── Bridge orchestration ──
//
// Wires the registry, publisher, poll loop and query responder together
// and owns the cancellation token and task handles for both activities.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::{Bus, InboundMessage};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::poll::PollLoop;
use crate::publisher::{Publisher, Topics};
use crate::registry::Registry;
use crate::responder::QueryResponder;
use crate::source::StationSource;

pub struct Bridge<S, B> {
    config: BridgeConfig,
    source: Arc<S>,
    bus: Arc<B>,
    registry: Arc<Registry>,
}

impl<S: StationSource, B: Bus> Bridge<S, B> {
    pub fn new(config: BridgeConfig, source: Arc<S>, bus: Arc<B>) -> Self {
        Self {
            config,
            source,
            bus,
            registry: Arc::new(Registry::new()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Subscribe to status queries and spawn the poll and responder tasks.
    ///
    /// A failed subscription is a startup error; nothing is spawned.
    pub async fn start(
        self,
        inbound: mpsc::Receiver<InboundMessage>,
    ) -> Result<BridgeHandle, CoreError> {
        let topics = Topics::new(self.config.namespace.clone());
        let filter = topics.get_filter();
        self.bus.subscribe(&filter).await?;
        info!(filter = %filter, "subscribed to status queries");

        let publisher = Publisher::new(Arc::clone(&self.bus), topics);
        let cancel = CancellationToken::new();

        let poll = PollLoop::new(
            Arc::clone(&self.source),
            Arc::clone(&self.registry),
            publisher.clone(),
            self.config.poll_interval,
        );
        let responder = QueryResponder::new(Arc::clone(&self.registry), publisher);

        let tasks = vec![
            tokio::spawn(poll.run(cancel.child_token())),
            tokio::spawn(responder.run(inbound, cancel.child_token())),
        ];

        Ok(BridgeHandle {
            registry: self.registry,
            cancel,
            tasks,
        })
    }
}

/// Running bridge. Dropping it without [`shutdown`](Self::shutdown)
/// leaves the tasks running.
pub struct BridgeHandle {
    registry: Arc<Registry>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Stop the timer, abandon or finish the in-flight cycle, and wait for
    /// both tasks to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "bridge task ended abnormally");
            }
        }
        info!(stations = self.registry.len(), "bridge stopped");
    }
}
