//! Configuration for the UniFi to MQTT bridge.
//!
//! Layers built-in defaults, an optional TOML file and the process
//! environment (highest priority), validates the result, and translates it
//! into the core's `ControllerConfig`, `BusConfig` and `BridgeConfig`.
//! TOML files use the lowercase form of the environment keys
//! (`mqtt_url`, `unifi_delay`, ...).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment, Metadata, Profile, Provider,
    value::{Dict, Map, Value},
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use mqtt_unifi_api::ControllerPlatform;
use mqtt_unifi_core::{
    BridgeConfig, BusConfig, ControllerConfig, PlatformSelection, TlsVerification,
};

/// Environment keys read by [`load`].
pub const KEYS: &[&str] = &[
    "MQTT_URL",
    "MQTT_LOGIN",
    "MQTT_PASSWORD",
    "MQTT_CLIENT_ID",
    "MQTT_TOPIC",
    "UNIFI_HOST",
    "UNIFI_PORT",
    "UNIFI_USER",
    "UNIFI_PASS",
    "UNIFI_SITE_ID",
    "UNIFI_VERSION",
    "UNIFI_PLATFORM",
    "UNIFI_INSECURE",
    "UNIFI_CA_CERT",
    "UNIFI_TIMEOUT",
    "UNIFI_DELAY",
    "DEBUG",
];

/// Free-text keys. figment's `Env` would read `007` as the number 7, so
/// these are re-read from the environment untouched.
const TEXT_KEYS: &[&str] = &[
    "MQTT_LOGIN",
    "MQTT_PASSWORD",
    "MQTT_CLIENT_ID",
    "MQTT_TOPIC",
    "UNIFI_HOST",
    "UNIFI_USER",
    "UNIFI_PASS",
    "UNIFI_SITE_ID",
];

/// Older deployments spell the poll interval key this way.
const DELAY_ALIAS: &str = "UNITI_DELAY";

const DEFAULT_API_VERSION: u32 = 5;
const MIN_API_VERSION: u32 = 4;
const DEFAULT_BROKER_PORT: u16 = 1883;
const BROKER_KEEP_ALIVE: Duration = Duration::from_secs(30);

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is mandatory but not set")]
    MissingMandatory { key: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Raw layered values ──────────────────────────────────────────────

/// A value as figment hands it over. Environment values that look like
/// numbers or booleans arrive typed; everything is read back as text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        }
    }
}

impl Scalar {
    /// Credentials keep surrounding whitespace.
    fn verbatim(self) -> String {
        match self {
            Self::Text(s) => s,
            other => other.text(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

fn present(value: Option<Scalar>) -> Option<String> {
    value.map(|v| v.text()).filter(|s| !s.is_empty())
}

fn present_verbatim(value: Option<Scalar>) -> Option<String> {
    value.map(Scalar::verbatim).filter(|s| !s.is_empty())
}

/// Environment values for [`TEXT_KEYS`], as strings.
struct TextEnv;

impl Provider for TextEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named("environment variable")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let dict = TEXT_KEYS
            .iter()
            .filter_map(|key| {
                let value = std::env::var(key).ok()?;
                Some((key.to_ascii_lowercase(), Value::from(value)))
            })
            .collect();
        Ok(Profile::Default.collect(dict))
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
struct RawConfig {
    mqtt_url: Scalar,
    mqtt_login: Option<Scalar>,
    mqtt_password: Option<Scalar>,
    mqtt_client_id: Scalar,
    mqtt_topic: Scalar,
    unifi_host: Scalar,
    unifi_port: Scalar,
    unifi_user: Option<Scalar>,
    unifi_pass: Option<Scalar>,
    unifi_site_id: Scalar,
    unifi_version: Option<Scalar>,
    unifi_platform: Scalar,
    unifi_insecure: Scalar,
    unifi_ca_cert: Option<Scalar>,
    unifi_timeout: Scalar,
    unifi_delay: Scalar,
    debug: Option<Scalar>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            mqtt_url: "tcp://localhost:1883".into(),
            mqtt_login: None,
            mqtt_password: None,
            mqtt_client_id: "mqtt-unifi".into(),
            mqtt_topic: "mqtt-unifi".into(),
            unifi_host: "localhost".into(),
            unifi_port: Scalar::Int(8443),
            unifi_user: None,
            unifi_pass: None,
            unifi_site_id: "default".into(),
            unifi_version: None,
            unifi_platform: "classic".into(),
            unifi_insecure: Scalar::Bool(true),
            unifi_ca_cert: None,
            unifi_timeout: "30s".into(),
            unifi_delay: "1s".into(),
            debug: None,
        }
    }
}

// ── Resolved configuration ──────────────────────────────────────────

/// Everything the binary needs, validated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub bus: BusConfig,
    pub bridge: BridgeConfig,
    /// Controller API generation (`UNIFI_VERSION`).
    pub api_version: u32,
    /// `DEBUG` was set to `true`, `True` or `1`.
    pub debug: bool,
}

/// The layered provider: defaults, optional TOML file, environment.
pub fn provider(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(RawConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(
            Env::raw()
                .only(&[DELAY_ALIAS])
                .map(|_| "unifi_delay".into()),
        )
        .merge(Env::raw().only(KEYS))
        .merge(TextEnv)
}

/// Load and validate the configuration.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_owned(),
            });
        }
    }

    let raw: RawConfig = provider(path).extract()?;
    raw.resolve()
}

impl RawConfig {
    fn resolve(self) -> Result<AppConfig, ConfigError> {
        let username = present_verbatim(self.unifi_user).ok_or(ConfigError::MissingMandatory {
            key: "UNIFI_USER",
        })?;
        let password = present_verbatim(self.unifi_pass).ok_or(ConfigError::MissingMandatory {
            key: "UNIFI_PASS",
        })?;

        let api_version = parse_api_version(self.unifi_version.as_ref())?;
        let platform = parse_platform(&self.unifi_platform.text())?;
        if api_version < DEFAULT_API_VERSION
            && platform != PlatformSelection::Fixed(ControllerPlatform::ClassicController)
        {
            return Err(invalid(
                "UNIFI_PLATFORM",
                format!("API version {api_version} controllers are always 'classic'"),
            ));
        }

        let port = parse_port("UNIFI_PORT", &self.unifi_port.text())?;
        let url = controller_url(&self.unifi_host.text(), port)?;

        let tls = if let Some(ca) = present(self.unifi_ca_cert) {
            TlsVerification::CustomCa(PathBuf::from(ca))
        } else if parse_flag("UNIFI_INSECURE", &self.unifi_insecure.text())? {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        };

        let site = self.unifi_site_id.text();
        if site.is_empty() {
            return Err(invalid("UNIFI_SITE_ID", "must not be empty"));
        }

        let controller = ControllerConfig {
            url,
            site,
            username,
            password: SecretString::from(password),
            platform,
            tls,
            timeout: parse_duration("UNIFI_TIMEOUT", &self.unifi_timeout.text())?,
        };

        let (host, port) = broker_address(&self.mqtt_url.text())?;
        let client_id = self.mqtt_client_id.text();
        if client_id.is_empty() {
            return Err(invalid("MQTT_CLIENT_ID", "must not be empty"));
        }
        let credentials = present_verbatim(self.mqtt_login).map(|login| {
            let password = present_verbatim(self.mqtt_password).unwrap_or_default();
            (login, SecretString::from(password))
        });
        let bus = BusConfig {
            host,
            port,
            client_id,
            credentials,
            keep_alive: BROKER_KEEP_ALIVE,
        };

        let bridge = BridgeConfig {
            namespace: parse_namespace(&self.mqtt_topic.text())?,
            poll_interval: parse_duration("UNIFI_DELAY", &self.unifi_delay.text())?,
        };

        Ok(AppConfig {
            controller,
            bus,
            bridge,
            api_version,
            debug: self
                .debug
                .is_some_and(|d| matches!(d.text().as_str(), "true" | "True" | "1")),
        })
    }
}

// ── Field parsers ───────────────────────────────────────────────────

/// Unparseable values fall back to the default; known-too-old ones are rejected.
fn parse_api_version(raw: Option<&Scalar>) -> Result<u32, ConfigError> {
    let version = raw
        .and_then(|v| v.text().parse::<u32>().ok())
        .unwrap_or(DEFAULT_API_VERSION);
    if version < MIN_API_VERSION {
        return Err(invalid(
            "UNIFI_VERSION",
            format!("controller API version {version} is not supported (minimum {MIN_API_VERSION})"),
        ));
    }
    Ok(version)
}

fn parse_platform(raw: &str) -> Result<PlatformSelection, ConfigError> {
    if raw.eq_ignore_ascii_case("auto") {
        return Ok(PlatformSelection::Auto);
    }
    ControllerPlatform::from_str(raw)
        .map(PlatformSelection::Fixed)
        .map_err(|_| {
            invalid(
                "UNIFI_PLATFORM",
                format!("expected 'classic', 'unifi-os', or 'auto', got '{raw}'"),
            )
        })
}

fn parse_port(field: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| invalid(field, format!("'{raw}' is not a valid port")))
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, format!("expected a boolean, got '{raw}'"))),
    }
}

/// humantime duration (`1s`, `500ms`, `2m`); zero is rejected.
fn parse_duration(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(raw)
        .map_err(|e| invalid(field, format!("'{raw}' is not a duration: {e}")))?;
    if duration.is_zero() {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(duration)
}

/// `UNIFI_HOST` may carry its own scheme and port; otherwise `https` and
/// `UNIFI_PORT` are used.
fn controller_url(host: &str, port: u16) -> Result<Url, ConfigError> {
    if host.is_empty() {
        return Err(invalid("UNIFI_HOST", "must not be empty"));
    }
    let base = if host.contains("://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };

    let mut url =
        Url::parse(&base).map_err(|e| invalid("UNIFI_HOST", format!("'{host}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "UNIFI_HOST",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.port().is_none() {
        url.set_port(Some(port))
            .map_err(|()| invalid("UNIFI_HOST", format!("'{host}' cannot carry a port")))?;
    }
    Ok(url)
}

/// Accepts `tcp://host:port`, `mqtt://host:port` or bare `host:port`.
fn broker_address(raw: &str) -> Result<(String, u16), ConfigError> {
    let with_scheme = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("tcp://{raw}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid("MQTT_URL", format!("'{raw}': {e}")))?;

    if !matches!(url.scheme(), "tcp" | "mqtt") {
        return Err(invalid(
            "MQTT_URL",
            format!("unsupported scheme '{}' (use tcp:// or mqtt://)", url.scheme()),
        ));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("MQTT_URL", format!("'{raw}' has no host")))?;

    Ok((host.to_owned(), url.port().unwrap_or(DEFAULT_BROKER_PORT)))
}

/// The topic namespace may not contain MQTT wildcards.
fn parse_namespace(raw: &str) -> Result<String, ConfigError> {
    let namespace = raw.trim_end_matches('/');
    if namespace.is_empty() {
        return Err(invalid("MQTT_TOPIC", "must not be empty"));
    }
    if namespace.contains(['+', '#']) {
        return Err(invalid("MQTT_TOPIC", "must not contain '+' or '#'"));
    }
    Ok(namespace.to_owned())
}
