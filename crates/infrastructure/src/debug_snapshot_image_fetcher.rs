use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use motionwatch_application::ImageFetcher;
use motionwatch_core::AppResult;
use motionwatch_domain::ImageCredentials;
use tracing::{debug, warn};

/// Writes every fetched snapshot to a fixed path before handing it on.
///
/// The file is overwritten on each fetch; write failures are logged and never
/// fail the fetch.
pub struct DebugSnapshotImageFetcher {
    inner: Arc<dyn ImageFetcher>,
    path: PathBuf,
}

impl DebugSnapshotImageFetcher {
    /// Wraps a fetcher.
    #[must_use]
    pub fn new(inner: Arc<dyn ImageFetcher>, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ImageFetcher for DebugSnapshotImageFetcher {
    async fn fetch_image(
        &self,
        url: &str,
        credentials: Option<&ImageCredentials>,
    ) -> AppResult<Vec<u8>> {
        let image = self.inner.fetch_image(url, credentials).await?;

        match tokio::fs::write(&self.path, &image).await {
            Ok(()) => debug!(path = %self.path.display(), "debug snapshot written"),
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "failed to write debug snapshot");
            }
        }

        Ok(image)
    }
}
