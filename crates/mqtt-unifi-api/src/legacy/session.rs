// Cookie session handling.
//
// A successful login leaves the session cookie in the client's jar, and
// every later request carries it. UniFi OS also hands out a CSRF token that
// must accompany POSTs such as logout. Login and logout paths depend on the
// platform; `detect_platform` works that out before a client exists.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::legacy::client::{LegacyClient, preview, rooted};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl LegacyClient {
    /// Log in with a local controller account.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.session_url(self.platform().login_path())?;
        debug!(%url, username, "logging in");

        let request = self.http().post(url).json(&Credentials {
            username,
            password: password.expose_secret(),
        });
        let resp = self.send(request).await?;

        let status = resp.status();
        if status.is_success() {
            self.capture_csrf(resp.headers());
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Authentication {
            message: format!("login answered HTTP {status}: {}", preview(&body)),
        })
    }

    /// End the session. A non-2xx answer is reported as an API error.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.session_url(self.platform().logout_path())?;
        debug!(%url, "logging out");

        let status = self
            .send(self.with_csrf(self.http().post(url)))
            .await?
            .status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::LegacyApi {
                message: format!("logout answered HTTP {status}"),
            })
        }
    }

    /// Work out which platform serves `base_url`.
    ///
    /// UniFi OS answers something (usually 401 or 405) on `/api/auth/login`;
    /// a classic controller has no such route and answers 404. The classic
    /// login route is then tried so an unreachable host is an error rather
    /// than a guess.
    pub async fn detect_platform(
        http: &reqwest::Client,
        base_url: &Url,
    ) -> Result<ControllerPlatform, Error> {
        let console = rooted(base_url, ControllerPlatform::UnifiOs.login_path())?;
        match http.get(console).send().await {
            Ok(resp) if resp.status() != StatusCode::NOT_FOUND => {
                return Ok(ControllerPlatform::UnifiOs);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "UniFi OS login route unreachable"),
        }

        let classic = rooted(base_url, ControllerPlatform::ClassicController.login_path())?;
        http.get(classic).send().await?;
        Ok(ControllerPlatform::ClassicController)
    }
}
