//! Channel selection for a finished analysis.

use motionwatch_domain::{DetectionResult, NotificationChannel, NotificationDecision};
use tracing::debug;

use crate::CooldownLimiter;

/// Decides which notification channels fire for one detection.
///
/// Voice and SMS each have an optional global limiter; a denial on one channel
/// never affects the other.
pub struct NotificationGate {
    sms_enabled: bool,
    voice_limiter: Option<CooldownLimiter>,
    sms_limiter: Option<CooldownLimiter>,
}

impl NotificationGate {
    /// Creates a gate without channel limiters.
    #[must_use]
    pub fn new(sms_enabled: bool) -> Self {
        Self {
            sms_enabled,
            voice_limiter: None,
            sms_limiter: None,
        }
    }

    /// Throttles voice announcements with a global limiter.
    #[must_use]
    pub fn with_voice_limiter(mut self, limiter: CooldownLimiter) -> Self {
        self.voice_limiter = Some(limiter);
        self
    }

    /// Throttles SMS with a global limiter.
    #[must_use]
    pub fn with_sms_limiter(mut self, limiter: CooldownLimiter) -> Self {
        self.sms_limiter = Some(limiter);
        self
    }

    /// Selects the channels to notify.
    ///
    /// A channel's limiter is only consulted, and therefore only advanced, when
    /// every other condition for that channel holds.
    pub fn decide(
        &self,
        result: &DetectionResult,
        voice_enabled: bool,
        home_occupied: bool,
    ) -> NotificationDecision {
        if result.is_nothing_detected() {
            return NotificationDecision::silent();
        }

        let send_voice =
            voice_enabled && Self::permits(self.voice_limiter.as_ref(), NotificationChannel::Voice);
        let send_sms = self.sms_enabled
            && !home_occupied
            && Self::permits(self.sms_limiter.as_ref(), NotificationChannel::Sms);

        NotificationDecision {
            send_voice,
            send_sms,
        }
    }

    fn permits(limiter: Option<&CooldownLimiter>, channel: NotificationChannel) -> bool {
        let Some(limiter) = limiter else {
            return true;
        };

        let permitted = limiter.check_and_update();
        if !permitted {
            debug!(
                channel = channel.as_str(),
                remaining_ms = u64::try_from(limiter.remaining().as_millis()).unwrap_or(u64::MAX),
                "notification channel in cooldown"
            );
        }

        permitted
    }
}
