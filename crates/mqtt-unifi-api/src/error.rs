use std::time::Duration;

use thiserror::Error;

/// Failures talking to the controller's legacy API.
///
/// `mqtt-unifi-core` folds these into `CoreError`; the bridge only needs to
/// tell an expired session (log in again) from everything else (skip the
/// poll cycle).
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials rejected, or the controller answered 401.
    #[error("controller rejected the credentials: {message}")]
    Authentication { message: String },

    /// `api.err.LoginRequired`: the session cookie is no longer valid.
    #[error("controller session expired")]
    SessionExpired,

    #[error("request to controller failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid controller URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("controller did not answer within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Envelope with `rc != "ok"`, or an unexpected HTTP status.
    #[error("controller returned an error: {message}")]
    LegacyApi { message: String },

    /// Body was not the JSON we expected. `body` keeps the raw text.
    #[error("unexpected response body: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Whether logging in again could clear this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }
}
