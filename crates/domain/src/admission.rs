use serde::{Deserialize, Serialize};

/// Reason a webhook call was not admitted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The location was admitted too recently.
    Cooldown,
    /// Another request for the same location is still being analyzed.
    InProgress,
}

impl SkipReason {
    /// Returns the reason code reported to the webhook caller.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooldown => "skipped_cooldown",
            Self::InProgress => "skipped_in_progress",
        }
    }
}

/// Outcome of one admission decision, without the in-flight permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The request may run its analysis.
    Admitted,
    /// The request was dropped because of the per-location cooldown.
    SkippedCooldown,
    /// The request was dropped because the location is already in flight.
    SkippedInProgress,
}
