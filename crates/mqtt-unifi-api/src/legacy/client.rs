// Legacy API HTTP client
//
// URL construction for both platforms plus the response pipeline:
// HTTP status first, then the UniFi OS error body, then the `{meta,data}`
// envelope. Endpoints live in `stat.rs`, session handling in `session.rs`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::legacy::models::{ConsoleError, Envelope};
use crate::transport::TransportConfig;

const LOGIN_REQUIRED: &str = "api.err.LoginRequired";
const CSRF_HEADER: &str = "x-csrf-token";
const CSRF_ROTATED_HEADER: &str = "x-updated-csrf-token";
const PREVIEW_CHARS: usize = 200;

/// Session-holding client for one controller site.
///
/// Clones share the connection pool, the cookie jar and the CSRF token, so
/// a clone taken after login is logged in too.
#[derive(Clone)]
pub struct LegacyClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
    platform: ControllerPlatform,
    /// UniFi OS rejects POSTs through its proxy without this token. Set at
    /// login, rotated by `X-Updated-CSRF-Token` on later responses.
    csrf_token: Arc<RwLock<Option<String>>>,
    /// Request timeout the HTTP client was built with, when known.
    timeout: Option<Duration>,
}

impl LegacyClient {
    /// Build a client with its own cookie jar.
    ///
    /// `base_url` is the controller root: `https://console` for UniFi OS,
    /// `https://host:8443` for a classic controller.
    pub fn new(
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.clone().with_cookie_jar().build_client()?;
        Ok(Self {
            timeout: Some(transport.timeout),
            ..Self::with_client(http, base_url, site, platform)
        })
    }

    /// Use a caller-built `reqwest::Client`. Sessions only stick if it has
    /// a cookie store.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
    ) -> Self {
        Self {
            http,
            base_url,
            site,
            platform,
            csrf_token: Arc::new(RwLock::new(None)),
            timeout: None,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Point site-scoped requests at another site, keeping the session.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn platform(&self) -> ControllerPlatform {
        self.platform
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── CSRF token ───────────────────────────────────────────────────

    /// Keep the token from a login response, if the controller sent one.
    pub(crate) fn capture_csrf(&self, headers: &HeaderMap) {
        if let Some(token) = header_text(headers, CSRF_HEADER) {
            debug!("storing CSRF token");
            self.store_csrf(token);
        }
    }

    fn rotate_csrf(&self, headers: &HeaderMap) {
        if let Some(token) = header_text(headers, CSRF_ROTATED_HEADER) {
            trace!("CSRF token rotated");
            self.store_csrf(token);
        }
    }

    fn store_csrf(&self, token: String) {
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Attach the stored token, if any.
    pub(crate) fn with_csrf(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self
            .csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    // ── URLs ─────────────────────────────────────────────────────────

    /// `{base}{path}` for session endpoints, keeping any path already in
    /// the base URL.
    pub(crate) fn session_url(&self, path: &str) -> Result<Url, Error> {
        rooted(&self.base_url, path)
    }

    /// `{base}{prefix}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/api/{path}", self.api_root()))?)
    }

    /// `{base}{prefix}/api/s/{site}/{path}`
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "{}/api/s/{}/{path}",
            self.api_root(),
            self.site
        ))?)
    }

    fn api_root(&self) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.platform.legacy_prefix()
        )
    }

    // ── Responses ────────────────────────────────────────────────────

    /// Send `request`, reporting an elapsed request timeout as `Timeout`.
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, Error> {
        request.send().await.map_err(|e| match self.timeout {
            Some(timeout) if e.is_timeout() => Error::Timeout { timeout },
            _ => Error::Transport(e),
        })
    }

    /// GET `url` and return the envelope's `data`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        trace!(%url, "GET");
        let resp = self.send(self.http.get(url)).await?;
        self.rotate_csrf(resp.headers());
        let body = check_status(resp).await?;
        unwrap_envelope(&body)
    }
}

/// `base` with `path` appended. Unlike `Url::join` with an absolute path,
/// this keeps a base such as `https://host/unifi`.
pub(crate) fn rooted(base: &Url, path: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!(
        "{}{path}",
        base.as_str().trim_end_matches('/')
    ))?)
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Map failing HTTP statuses to errors; return the body otherwise.
async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        }),
        StatusCode::FORBIDDEN => Err(Error::LegacyApi {
            message: "account lacks permission for this site (HTTP 403)".into(),
        }),
        s if s.is_success() => Ok(resp.text().await?),
        _ => {
            let body = resp.text().await.unwrap_or_default();
            Err(Error::LegacyApi {
                message: format!("HTTP {status}: {}", preview(&body)),
            })
        }
    }
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, Error> {
    if let Ok(ConsoleError { error }) = serde_json::from_str::<ConsoleError>(body) {
        let message = error.message.unwrap_or_default();
        return Err(match error.code {
            401 => Error::Authentication { message },
            code => Error::LegacyApi {
                message: format!("UniFi OS error {code}: {message}"),
            },
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("{e} (starts with {:?})", preview(body)),
            body: body.to_owned(),
        })?;

    if envelope.meta.rc == "ok" {
        return Ok(envelope.data);
    }
    match envelope.meta.msg {
        Some(msg) if msg == LOGIN_REQUIRED => Err(Error::SessionExpired),
        Some(msg) => Err(Error::LegacyApi { message: msg }),
        None => Err(Error::LegacyApi {
            message: format!("rc={}", envelope.meta.rc),
        }),
    }
}

/// Leading slice of a body for error messages, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::legacy::models::LegacySite;

    fn client(platform: ControllerPlatform) -> LegacyClient {
        LegacyClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://unifi.local:8443/").unwrap(),
            "default".into(),
            platform,
        )
    }

    #[test]
    fn classic_site_url_has_no_prefix() {
        let url = client(ControllerPlatform::ClassicController)
            .site_url("stat/sta")
            .unwrap();
        assert_eq!(url.as_str(), "https://unifi.local:8443/api/s/default/stat/sta");
    }

    #[test]
    fn unifi_os_urls_go_through_the_network_proxy() {
        let c = client(ControllerPlatform::UnifiOs).with_site("lab");
        assert_eq!(
            c.api_url("self/sites").unwrap().as_str(),
            "https://unifi.local:8443/proxy/network/api/self/sites"
        );
        assert_eq!(
            c.site_url("stat/device").unwrap().as_str(),
            "https://unifi.local:8443/proxy/network/api/s/lab/stat/device"
        );
    }

    #[test]
    fn session_urls_keep_a_base_path() {
        let c = LegacyClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://gateway.lan/unifi/").unwrap(),
            "default".into(),
            ControllerPlatform::ClassicController,
        );
        assert_eq!(
            c.session_url("/api/login").unwrap().as_str(),
            "https://gateway.lan/unifi/api/login"
        );
        assert_eq!(
            c.site_url("stat/sta").unwrap().as_str(),
            "https://gateway.lan/unifi/api/s/default/stat/sta"
        );
    }

    #[test]
    fn envelope_without_msg_reports_rc() {
        let err = unwrap_envelope::<LegacySite>(r#"{"meta":{"rc":"error"}}"#).unwrap_err();
        assert!(matches!(err, Error::LegacyApi { ref message } if message == "rc=error"));
    }

    #[test]
    fn envelope_data_defaults_to_empty() {
        let sites = unwrap_envelope::<LegacySite>(r#"{"meta":{"rc":"ok"}}"#).unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
