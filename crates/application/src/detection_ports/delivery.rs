use async_trait::async_trait;
use motionwatch_core::{AppResult, LocationKey};
use motionwatch_domain::DetectionResult;

/// Port for outbound text messages.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Sends one message to the configured recipient.
    async fn send_sms(&self, message: &str) -> AppResult<()>;
}

/// Port for off-site storage of detection snapshots.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Uploads the snapshot and returns a URL pointing at the stored copy.
    async fn upload_image(
        &self,
        image: &[u8],
        location: &LocationKey,
        description: &DetectionResult,
    ) -> AppResult<String>;
}
