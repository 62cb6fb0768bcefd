use async_trait::async_trait;
use motionwatch_core::{AppResult, LocationKey};
use motionwatch_domain::{DetectionResult, ImageCredentials};

/// Port for downloading a camera snapshot.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the JPEG bytes behind `url`, using basic auth when credentials are given.
    async fn fetch_image(
        &self,
        url: &str,
        credentials: Option<&ImageCredentials>,
    ) -> AppResult<Vec<u8>>;
}

/// Port for the vision-language model.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Describes what the camera at `location` sees.
    ///
    /// Returns [`DetectionResult::NOTHING_DETECTED`] when nothing of interest is in frame.
    async fn analyze_image(
        &self,
        image: &[u8],
        location: &LocationKey,
    ) -> AppResult<DetectionResult>;
}
