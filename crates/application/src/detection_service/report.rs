use chrono::{DateTime, Utc};
use motionwatch_core::LocationKey;
use motionwatch_domain::{DetectionResult, NotificationDecision, SkipReason};
use uuid::Uuid;

/// What happened to one webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// The snapshot was analyzed.
    Analyzed {
        /// Model answer.
        result: DetectionResult,
        /// Channels selected by the notification gate.
        decision: NotificationDecision,
        /// Location of the off-site copy, when one was stored.
        backup_url: Option<String>,
    },
    /// The call was not admitted.
    Skipped(SkipReason),
}

/// Report returned to the webhook front-end.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    /// Identifier used in the logs of this event.
    pub event_id: Uuid,
    /// Camera location of the event.
    pub location: LocationKey,
    /// Analysis result or skip reason.
    pub outcome: DetectionOutcome,
    /// When handling finished.
    pub completed_at: DateTime<Utc>,
}

impl DetectionReport {
    pub(super) fn new(event_id: Uuid, location: LocationKey, outcome: DetectionOutcome) -> Self {
        Self {
            event_id,
            location,
            outcome,
            completed_at: Utc::now(),
        }
    }

    /// Returns the analysis text, or the skip reason code.
    #[must_use]
    pub fn result_text(&self) -> &str {
        match &self.outcome {
            DetectionOutcome::Analyzed { result, .. } => result.as_str(),
            DetectionOutcome::Skipped(reason) => reason.as_str(),
        }
    }

    /// Returns the skip reason, if the call was not admitted.
    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.outcome {
            DetectionOutcome::Skipped(reason) => Some(reason),
            DetectionOutcome::Analyzed { .. } => None,
        }
    }
}
