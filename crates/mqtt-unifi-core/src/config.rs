// ── Runtime configuration ──
//
// These types describe how to reach the controller and the broker and how
// the bridge behaves. They carry credential data and tuning, but never
// touch disk or the environment: mqtt-unifi-config builds them.

use std::time::Duration;

use mqtt_unifi_api::ControllerPlatform;
use secrecy::SecretString;
use url::Url;

/// Which controller flavour to speak to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSelection {
    /// Probe the controller on connect.
    Auto,
    Fixed(ControllerPlatform),
}

impl From<ControllerPlatform> for PlatformSelection {
    fn from(platform: ControllerPlatform) -> Self {
        Self::Fixed(platform)
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for the controller session.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g. `https://192.168.1.1:8443`).
    pub url: Url,
    /// Site short name or id (defaults to "default").
    pub site: String,
    pub username: String,
    pub password: SecretString,
    pub platform: PlatformSelection,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
}

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Sent only when a login name is configured.
    pub credentials: Option<(String, SecretString)>,
    pub keep_alive: Duration,
}

/// Bridge behaviour: topic namespace and poll cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub namespace: String,
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: "mqtt-unifi".into(),
            poll_interval: Duration::from_secs(1),
        }
    }
}
