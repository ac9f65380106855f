use async_trait::async_trait;
use url::Url;

use super::SyncError;

/// Raw HTTP seam between the controller and the network.
///
/// Implementations return the response body for 2xx responses and map every
/// other outcome onto a [`SyncError`]. Futures are not `Send`: the client runs
/// on the browser's single-threaded event loop.
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, url: &Url) -> Result<String, SyncError>;

    /// POST `body` as `application/json`.
    async fn post_json(&self, url: &Url, body: &str) -> Result<String, SyncError>;
}
