use motionwatch_core::LocationKey;
use serde::{Deserialize, Serialize};

use crate::DetectionResult;

/// Notification delivery path with its own enable and cooldown policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Spoken announcement on the home-automation satellites.
    Voice,
    /// Text message through the SMS gateway.
    Sms,
}

impl NotificationChannel {
    /// Returns a stable name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Sms => "sms",
        }
    }
}

/// Channels the caller is allowed to notify for one detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationDecision {
    /// Whether a voice announcement should be sent.
    pub send_voice: bool,
    /// Whether an SMS should be sent.
    pub send_sms: bool,
}

impl NotificationDecision {
    /// Decision that notifies nobody.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Returns whether the given channel was selected.
    #[must_use]
    pub fn allows(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Voice => self.send_voice,
            NotificationChannel::Sms => self.send_sms,
        }
    }
}

/// Builds the announcement text for one detection.
#[must_use]
pub fn announcement_message(location: &LocationKey, result: &DetectionResult) -> String {
    format!("{location}: {result}")
}
