use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use motionwatch_application::BackupStore;
use motionwatch_core::{AppError, AppResult, LocationKey};
use motionwatch_domain::DetectionResult;

use crate::http_support::send_checked;

const DEFAULT_UPLOAD_BASE_URL: &str = "https://storage.googleapis.com";
const PUBLIC_BASE_URL: &str = "https://storage.cloud.google.com";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DESCRIPTION_MAX_CHARS: usize = 50;

/// Snapshot backup into a Google Cloud Storage bucket.
pub struct GcsBackupStore {
    http_client: reqwest::Client,
    upload_base_url: String,
    bucket: String,
    access_token: String,
}

impl GcsBackupStore {
    /// Creates a store that uploads with an OAuth2 bearer token.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        bucket: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_owned(),
            bucket: bucket.into(),
            access_token: access_token.into(),
        }
    }

    /// Points uploads at another JSON API host, such as a storage emulator.
    #[must_use]
    pub fn with_upload_base_url(mut self, upload_base_url: impl Into<String>) -> Self {
        self.upload_base_url = upload_base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn upload_url(&self, object_name: &str) -> AppResult<url::Url> {
        url::Url::parse_with_params(
            &format!(
                "{}/upload/storage/v1/b/{}/o",
                self.upload_base_url, self.bucket
            ),
            &[("uploadType", "media"), ("name", object_name)],
        )
        .map_err(|error| AppError::Internal(format!("invalid backup upload url: {error}")))
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("{PUBLIC_BASE_URL}/{}/{object_name}", self.bucket)
    }
}

/// Builds `{YYYYmmdd_HHMMSS}_{location}_{description}.jpg`.
#[must_use]
pub fn object_name<Tz: TimeZone>(
    taken_at: &DateTime<Tz>,
    location: &LocationKey,
    description: &DetectionResult,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_{location}_{}.jpg",
        taken_at.format("%Y%m%d_%H%M%S"),
        sanitize_description(description.as_str())
    )
}

/// Reduces a model answer to a short file-name fragment.
///
/// Spaces become underscores, anything outside `[A-Za-z0-9_]` is dropped, the
/// result is cut to 50 characters and lowercased.
#[must_use]
pub fn sanitize_description(description: &str) -> String {
    description
        .chars()
        .map(|character| if character == ' ' { '_' } else { character })
        .filter(|character| character.is_ascii_alphanumeric() || *character == '_')
        .take(DESCRIPTION_MAX_CHARS)
        .collect::<String>()
        .to_ascii_lowercase()
}

#[async_trait]
impl BackupStore for GcsBackupStore {
    async fn upload_image(
        &self,
        image: &[u8],
        location: &LocationKey,
        description: &DetectionResult,
    ) -> AppResult<String> {
        let object_name = object_name(&Local::now(), location, description);

        let request = self
            .http_client
            .post(self.upload_url(&object_name)?)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .timeout(UPLOAD_TIMEOUT)
            .body(image.to_vec());

        send_checked(request, "snapshot backup upload").await?;
        Ok(self.public_url(&object_name))
    }
}
