//! Process-level errors with miette diagnostics.
//!
//! Every fatal startup failure ends up here; `main` is the only place that
//! turns one into an exit code.

use miette::Diagnostic;
use thiserror::Error;

use mqtt_unifi_config::ConfigError;
use mqtt_unifi_core::{BusError, CoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const BUS: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(mqtt_unifi::config),
        help(
            "Set UNIFI_USER and UNIFI_PASS, and check the other UNIFI_* / MQTT_* values.\n\
             Durations use humantime syntax, e.g. UNIFI_DELAY=1s or 500ms."
        )
    )]
    Config(#[from] ConfigError),

    #[error("Site '{name}' does not exist on the controller")]
    #[diagnostic(
        code(mqtt_unifi::site_not_found),
        help("Set UNIFI_SITE_ID to the site's short name (shown in the controller URL) or id.")
    )]
    SiteNotFound { name: String },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Authentication with the controller failed: {message}")]
    #[diagnostic(
        code(mqtt_unifi::auth_failed),
        help("Verify UNIFI_USER / UNIFI_PASS. Local accounts work; SSO/2FA accounts do not.")
    )]
    AuthFailed { message: String },

    #[error("Could not connect to controller at {url}: {reason}")]
    #[diagnostic(
        code(mqtt_unifi::connection_failed),
        help(
            "Check UNIFI_HOST / UNIFI_PORT. Self-signed certificates need UNIFI_INSECURE=true\n\
             or UNIFI_CA_CERT. UniFi OS consoles need UNIFI_PLATFORM=unifi-os (or auto)."
        )
    )]
    ControllerUnreachable { url: String, reason: String },

    // ── Broker ───────────────────────────────────────────────────────
    #[error("MQTT broker error: {0}")]
    #[diagnostic(
        code(mqtt_unifi::broker),
        help("Check MQTT_URL and, if the broker requires it, MQTT_LOGIN / MQTT_PASSWORD.")
    )]
    Broker(BusError),

    // ── Everything else ──────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(mqtt_unifi::core))]
    Core(CoreError),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::SiteNotFound { .. } => exit_code::CONFIG,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ControllerUnreachable { .. } => exit_code::CONNECTION,
            Self::Broker(_) => exit_code::BUS,
            Self::Core(_) => exit_code::GENERAL,
        }
    }
}

impl From<BusError> for AppError {
    fn from(err: BusError) -> Self {
        Self::Broker(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::ConnectionFailed { url, reason } => {
                Self::ControllerUnreachable { url, reason }
            }
            CoreError::Timeout { timeout } => Self::ControllerUnreachable {
                url: String::new(),
                reason: format!("no answer within {timeout:?}"),
            },
            CoreError::SiteNotFound { name } => Self::SiteNotFound { name },
            CoreError::Bus(bus) => Self::Broker(bus),
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_failure_class() {
        let auth = AppError::from(CoreError::AuthenticationFailed {
            message: "bad password".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let site = AppError::from(CoreError::SiteNotFound {
            name: "lab".into(),
        });
        assert_eq!(site.exit_code(), exit_code::CONFIG);

        let unreachable = AppError::from(CoreError::ConnectionFailed {
            url: "https://10.0.0.1:8443".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(unreachable.exit_code(), exit_code::CONNECTION);

        let broker = AppError::from(CoreError::Bus(BusError::Connect("refused".into())));
        assert_eq!(broker.exit_code(), exit_code::BUS);

        let missing = AppError::from(ConfigError::MissingMandatory { key: "UNIFI_USER" });
        assert_eq!(missing.exit_code(), exit_code::CONFIG);

        let other = AppError::from(CoreError::Internal("boom".into()));
        assert_eq!(other.exit_code(), exit_code::GENERAL);
    }
}
