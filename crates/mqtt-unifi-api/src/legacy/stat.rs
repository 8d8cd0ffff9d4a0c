// The three reads a poll cycle and startup need.
//
// `stat/sta` only returns stations that are associated right now, which is
// exactly the presence set the bridge tracks.

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::legacy::models::{LegacyClientEntry, LegacyDevice, LegacySite};

impl LegacyClient {
    /// `GET /api/s/{site}/stat/sta`
    pub async fn list_clients(&self) -> Result<Vec<LegacyClientEntry>, Error> {
        self.get(self.site_url("stat/sta")?).await
    }

    /// `GET /api/s/{site}/stat/device`
    pub async fn list_devices(&self) -> Result<Vec<LegacyDevice>, Error> {
        self.get(self.site_url("stat/device")?).await
    }

    /// `GET /api/self/sites`. Not site-scoped: lists every site the
    /// logged-in account can see.
    pub async fn list_sites(&self) -> Result<Vec<LegacySite>, Error> {
        self.get(self.api_url("self/sites")?).await
    }
}
