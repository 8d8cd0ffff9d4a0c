// ── Controller session ──
//
// Owns the authenticated legacy-API session for one site and serves
// station reports to the poll loop. Expired sessions are renewed once
// per fetch before the cycle is given up.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use mqtt_unifi_api::transport::{TlsMode, TransportConfig};
use mqtt_unifi_api::LegacyClient;

use crate::config::{ControllerConfig, PlatformSelection, TlsVerification};
use crate::convert::access_point_table;
use crate::error::CoreError;
use crate::model::{ControllerReport, RawStation};
use crate::source::StationSource;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// Cheaply cloneable handle to the controller session.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: Mutex<Option<LegacyClient>>,
    connection_state: watch::Sender<ConnectionState>,
}

impl Controller {
    /// Create a controller. Does NOT connect: call
    /// [`connect()`](Self::connect) to authenticate.
    pub fn new(config: ControllerConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                client: Mutex::new(None),
                connection_state,
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Resolve the platform, log in, and verify the configured site exists.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        match self.establish().await {
            Ok(client) => {
                info!(
                    url = %self.inner.config.url,
                    site = client.site(),
                    platform = %client.platform(),
                    "connected to controller"
                );
                *self.inner.client.lock().await = Some(client);
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<LegacyClient, CoreError> {
        let config = &self.inner.config;
        let transport = build_transport(config);

        let platform = match config.platform {
            PlatformSelection::Fixed(platform) => platform,
            PlatformSelection::Auto => {
                let http = transport.build_client()?;
                let platform = LegacyClient::detect_platform(&http, &config.url).await?;
                debug!(%platform, "detected controller platform");
                platform
            }
        };

        let client = LegacyClient::new(
            config.url.clone(),
            config.site.clone(),
            platform,
            &transport,
        )?;
        client.login(&config.username, &config.password).await?;
        debug!("session authentication successful");

        let site = resolve_site(&client, &config.site).await?;
        Ok(client.with_site(site))
    }

    /// Log out and drop the session. Logout failures are logged only.
    pub async fn disconnect(&self) {
        let client = self.inner.client.lock().await.take();
        if let Some(client) = client {
            if let Err(e) = client.logout().await {
                warn!(error = %e, "logout failed (non-fatal)");
            } else {
                debug!("logged out of controller");
            }
        }
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
    }

    // ── Station reports ──────────────────────────────────────────

    async fn report(&self) -> Result<ControllerReport, CoreError> {
        // Clone the client and release the lock before any request.
        let client = self
            .inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)?;

        match fetch_report(&client).await {
            Err(e) if e.is_auth_expired() => {
                warn!(error = %e, "controller session expired, logging in again");
                let config = &self.inner.config;
                client.login(&config.username, &config.password).await?;
                fetch_report(&client).await.map_err(CoreError::from)
            }
            other => other.map_err(CoreError::from),
        }
    }
}

impl StationSource for Controller {
    async fn fetch(&self) -> Result<ControllerReport, CoreError> {
        self.report().await
    }
}

async fn fetch_report(client: &LegacyClient) -> Result<ControllerReport, mqtt_unifi_api::Error> {
    let (stations, devices) = tokio::try_join!(client.list_clients(), client.list_devices())?;
    debug!(
        stations = stations.len(),
        devices = devices.len(),
        "fetched controller state"
    );

    Ok(ControllerReport {
        stations: stations.into_iter().map(RawStation::from).collect(),
        access_points: access_point_table(devices),
    })
}

/// Find the configured site by short name or id; returns its short name.
async fn resolve_site(client: &LegacyClient, wanted: &str) -> Result<String, CoreError> {
    let sites = client.list_sites().await?;
    sites
        .into_iter()
        .find(|s| s.name == wanted || s.id == wanted)
        .map(|s| s.name)
        .ok_or_else(|| CoreError::SiteNotFound {
            name: wanted.to_owned(),
        })
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        cookie_jar: None, // LegacyClient::new adds one automatically
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
