// ── Station source contract ──

use std::future::Future;

use crate::error::CoreError;
use crate::model::ControllerReport;

/// Where the poll loop gets station and access-point data from.
///
/// Implemented by [`Controller`](crate::Controller) on top of the legacy
/// API; tests plug in scripted sources.
pub trait StationSource: Send + Sync + 'static {
    /// Fetch the current station list and access-point name table.
    fn fetch(&self) -> impl Future<Output = Result<ControllerReport, CoreError>> + Send;
}
