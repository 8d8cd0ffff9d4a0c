// reqwest client construction: TLS trust, request timeout, cookie jar.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("mqtt-unifi/", env!("CARGO_PKG_VERSION"));

/// How the controller's certificate is checked.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Platform trust store.
    System,
    /// Trust only the PEM bundle at this path (plus the platform store).
    CustomCa(PathBuf),
    /// Skip verification. Local controllers ship self-signed certificates.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        let builder = match &self.cookie_jar {
            Some(jar) => builder.cookie_provider(Arc::clone(jar)),
            None => builder,
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }

    /// Attach a fresh, empty cookie jar.
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA file {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_ca_file_names_the_path() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/ca.pem")),
            ..TransportConfig::default()
        };
        let err = config.build_client().unwrap_err();
        assert!(matches!(err, Error::Tls(ref msg) if msg.contains("/nonexistent/ca.pem")));
    }

    #[test]
    fn default_transport_builds() {
        let config = TransportConfig::default().with_cookie_jar();
        assert!(config.cookie_jar.is_some());
        config.build_client().unwrap();
    }
}
