use std::time::Duration;

use async_trait::async_trait;
use motionwatch_application::ImageFetcher;
use motionwatch_core::{AppError, AppResult};
use motionwatch_domain::ImageCredentials;

use crate::http_support::send_checked;

/// Downloads camera snapshots over HTTP.
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    /// Creates a fetcher with a per-request timeout.
    #[must_use]
    pub fn new(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(
        &self,
        url: &str,
        credentials: Option<&ImageCredentials>,
    ) -> AppResult<Vec<u8>> {
        let mut request = self.http_client.get(url).timeout(self.timeout);
        if let Some(credentials) = credentials {
            request = request.basic_auth(credentials.username(), Some(credentials.password()));
        }

        let response = send_checked(request, "camera image fetch").await?;
        let image = response.bytes().await.map_err(|error| {
            AppError::Upstream(format!("camera image body could not be read: {error}"))
        })?;

        if image.is_empty() {
            return Err(AppError::Upstream("camera returned an empty image".to_owned()));
        }

        Ok(image.to_vec())
    }
}
