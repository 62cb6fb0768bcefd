//! Single-action cooldown gate.
//!
//! One limiter guards one action: a camera location, or a whole notification
//! channel. It answers "has the cooldown elapsed since the last permitted
//! call?" and records the new baseline in the same critical section.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::Clock;

/// Thread-safe cooldown limiter.
pub struct CooldownLimiter {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    last_permitted_at: Mutex<Option<Instant>>,
}

impl CooldownLimiter {
    /// Creates a limiter that permits at most one action per `cooldown`.
    #[must_use]
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            last_permitted_at: Mutex::new(None),
        }
    }

    /// Permits the action when the cooldown has elapsed and records now as the
    /// new baseline. A denied call leaves the baseline untouched.
    ///
    /// The first call on a fresh limiter is always permitted.
    pub fn check_and_update(&self) -> bool {
        let mut last_permitted_at = self
            .last_permitted_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        let permitted = last_permitted_at
            .is_none_or(|previous| now.saturating_duration_since(previous) >= self.cooldown);
        if permitted {
            *last_permitted_at = Some(now);
        }

        permitted
    }

    /// Returns the time left before the next call would be permitted.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let last_permitted_at = *self
            .last_permitted_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        last_permitted_at.map_or(Duration::ZERO, |previous| {
            self.cooldown
                .saturating_sub(self.clock.now().saturating_duration_since(previous))
        })
    }
}
