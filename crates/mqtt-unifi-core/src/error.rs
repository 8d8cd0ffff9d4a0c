// ── Core error types ──
//
// The bridge's error vocabulary. Controller failures arrive as
// `mqtt_unifi_api::Error` and are folded in below; bus adapters report
// `BusError`.

use std::time::Duration;

use thiserror::Error;

/// Failures of the messaging-bus collaborator.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    #[error("Cannot connect to broker: {0}")]
    Connect(String),

    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("Subscribe to {filter} failed: {reason}")]
    Subscribe { filter: String, reason: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Controller ───────────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to controller")]
    NotConnected,

    #[error("Controller did not answer within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Site not found: {name}")]
    SiteNotFound { name: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Bus / process ────────────────────────────────────────────────
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether a fresh login might clear this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from the API crate ────────────────────────────────────

impl From<mqtt_unifi_api::Error> for CoreError {
    fn from(err: mqtt_unifi_api::Error) -> Self {
        use mqtt_unifi_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::SessionExpired => Self::AuthenticationFailed {
                message: "controller session expired".into(),
            },
            Api::Transport(e) if e.is_timeout() || e.is_connect() => Self::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            Api::Transport(e) => Self::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("controller URL: {e}"),
            },
            Api::Timeout { timeout } => Self::Timeout { timeout },
            Api::Tls(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason,
            },
            Api::LegacyApi { message } => Self::Api {
                message,
                status: None,
            },
            Api::Deserialization { message, .. } => {
                Self::Internal(format!("unreadable controller response: {message}"))
            }
        }
    }
}
