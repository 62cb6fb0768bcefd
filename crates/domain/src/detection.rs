use std::fmt::{Display, Formatter};

use motionwatch_core::{AppError, LocationKey};
use serde::{Deserialize, Serialize};

/// Text returned by the vision model for one camera frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult(String);

impl DetectionResult {
    /// Model answer meaning that nothing of interest was seen.
    pub const NOTHING_DETECTED: &'static str = "none";

    /// Creates a detection result from raw model output, trimming whitespace.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_owned())
    }

    /// Returns whether the model reported nothing of interest.
    #[must_use]
    pub fn is_nothing_detected(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::NOTHING_DETECTED)
    }

    /// Returns the result text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DetectionResult {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Basic-auth credentials for fetching a camera snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageCredentials {
    username: String,
    password: String,
}

impl ImageCredentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials only when both parts are present and non-empty.
    #[must_use]
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self::new(username, password))
            }
            _ => None,
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for ImageCredentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ImageCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One motion webhook call, validated.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    location: LocationKey,
    image_url: String,
    credentials: Option<ImageCredentials>,
    ignore_cooldown: bool,
}

impl DetectionEvent {
    /// Creates a detection event, rejecting an empty image URL.
    pub fn new(
        location: LocationKey,
        image_url: impl Into<String>,
        credentials: Option<ImageCredentials>,
        ignore_cooldown: bool,
    ) -> Result<Self, AppError> {
        let image_url = image_url.into();
        if image_url.trim().is_empty() {
            return Err(AppError::Validation("Missing jpegUrl parameter".to_owned()));
        }

        Ok(Self {
            location,
            image_url,
            credentials,
            ignore_cooldown,
        })
    }

    /// Returns the camera location.
    #[must_use]
    pub fn location(&self) -> &LocationKey {
        &self.location
    }

    /// Returns the snapshot URL.
    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image_url.as_str()
    }

    /// Returns the snapshot credentials, if any.
    #[must_use]
    pub fn credentials(&self) -> Option<&ImageCredentials> {
        self.credentials.as_ref()
    }

    /// Returns whether the per-location cooldown is bypassed.
    #[must_use]
    pub fn ignore_cooldown(&self) -> bool {
        self.ignore_cooldown
    }
}
