use motionwatch_application::DetectionReport;
use motionwatch_core::{AppResult, LocationKey};
use motionwatch_domain::{DetectionEvent, ImageCredentials};
use serde::{Deserialize, Deserializer, Serialize};

/// Motion webhook payload, from a query string, a JSON body or a form.
#[derive(Debug, Default, Deserialize)]
pub struct MotionRequest {
    #[serde(rename = "jpegUrl", default)]
    pub jpeg_url: Option<String>,
    #[serde(rename = "jpegurl", default)]
    pub jpeg_url_lowercase: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(
        rename = "ignoreCooldown",
        default,
        deserialize_with = "deserialize_flag"
    )]
    pub ignore_cooldown: bool,
}

impl MotionRequest {
    /// Returns the snapshot URL, preferring `jpegUrl` over `jpegurl`.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        [&self.jpeg_url, &self.jpeg_url_lowercase]
            .into_iter()
            .filter_map(Option::as_deref)
            .find(|value| !value.trim().is_empty())
    }

    pub fn into_event(self) -> AppResult<DetectionEvent> {
        let image_url = self.image_url().unwrap_or_default().to_owned();
        DetectionEvent::new(
            LocationKey::from_optional(self.location.as_deref()),
            image_url,
            ImageCredentials::from_parts(self.username.as_deref(), self.password.as_deref()),
            self.ignore_cooldown,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FlexibleFlag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0,
            Self::Text(value) => is_truthy(value),
        }
    }
}

/// Accepts `true`, `1` and `yes` in any case; everything else is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<FlexibleFlag>::deserialize(deserializer)?;
    Ok(flag.is_some_and(|flag| flag.is_set()))
}

/// Webhook answer: analysis text or skip reason.
#[derive(Debug, Serialize)]
pub struct MotionResponse {
    /// Identifier of this event in the service logs.
    pub event_id: String,
    pub location: String,
    pub result: String,
    pub timestamp: String,
}

impl From<DetectionReport> for MotionResponse {
    fn from(report: DetectionReport) -> Self {
        Self {
            event_id: report.event_id.to_string(),
            result: report.result_text().to_owned(),
            timestamp: report.completed_at.to_rfc3339(),
            location: report.location.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub in_flight: usize,
}

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
