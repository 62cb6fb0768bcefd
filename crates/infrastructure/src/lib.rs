//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod callmebot_sms_sender;
mod debug_snapshot_image_fetcher;
mod gcs_backup_store;
mod gemini_image_analyzer;
mod home_assistant_client;
mod http_image_fetcher;
mod http_support;
mod system_clock;

pub use callmebot_sms_sender::CallMeBotSmsSender;
pub use debug_snapshot_image_fetcher::DebugSnapshotImageFetcher;
pub use gcs_backup_store::{GcsBackupStore, object_name, sanitize_description};
pub use gemini_image_analyzer::{
    GeminiImageAnalyzer, GeminiModel, LOCATION_PLACEHOLDER, render_prompt,
};
pub use home_assistant_client::HomeAssistantClient;
pub use http_image_fetcher::HttpImageFetcher;
pub use system_clock::SystemClock;
