//! Admission of webhook calls for analysis.
//!
//! Every request passes two independent gates, in order:
//!
//! 1. the per-location cooldown (skipped when the caller asks to ignore it),
//! 2. the in-flight guard, so one location never runs two analyses at once.
//!
//! An admitted request carries an [`InFlightPermit`]; dropping it releases the
//! location on every exit path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use motionwatch_core::LocationKey;
use motionwatch_domain::AdmissionOutcome;
use tracing::debug;

use crate::in_flight_guard::{InFlightGuard, InFlightPermit};
use crate::{Clock, CooldownLimiter};


/// Result of one admission attempt.
#[derive(Debug)]
pub enum Admission {
    /// The request may proceed while it holds the permit.
    Admitted(InFlightPermit),
    /// The location was admitted less than one cooldown ago.
    SkippedCooldown,
    /// Another request for the location has not released it yet.
    SkippedInProgress,
}

impl Admission {
    /// Returns the outcome without the permit.
    #[must_use]
    pub fn outcome(&self) -> AdmissionOutcome {
        match self {
            Self::Admitted(_) => AdmissionOutcome::Admitted,
            Self::SkippedCooldown => AdmissionOutcome::SkippedCooldown,
            Self::SkippedInProgress => AdmissionOutcome::SkippedInProgress,
        }
    }

    /// Returns the permit of an admitted request.
    #[must_use]
    pub fn into_permit(self) -> Option<InFlightPermit> {
        match self {
            Self::Admitted(permit) => Some(permit),
            Self::SkippedCooldown | Self::SkippedInProgress => None,
        }
    }
}

/// Per-location admission state owned by the running server.
pub struct AdmissionController {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    // Limiters are created on first use and kept for the process lifetime.
    limiters: Mutex<HashMap<LocationKey, Arc<CooldownLimiter>>>,
    in_flight: InFlightGuard,
}

impl AdmissionController {
    /// Creates a controller applying `cooldown` to every location.
    #[must_use]
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            limiters: Mutex::new(HashMap::new()),
            in_flight: InFlightGuard::new(),
        }
    }

    /// Decides whether a request for `location` may run its analysis.
    ///
    /// The cooldown baseline moves at admission time, before any external
    /// work. Bypassed requests leave cooldown state untouched.
    pub fn admit(&self, location: &LocationKey, ignore_cooldown: bool) -> Admission {
        if !ignore_cooldown && !self.limiter_for(location).check_and_update() {
            debug!(location = %location, "admission denied by cooldown");
            return Admission::SkippedCooldown;
        }

        match self.in_flight.try_acquire(location) {
            Some(permit) => {
                debug!(location = %location, ignore_cooldown, "admission granted");
                Admission::Admitted(permit)
            }
            None => {
                debug!(location = %location, "admission denied, analysis in progress");
                Admission::SkippedInProgress
            }
        }
    }

    /// Releases `location` explicitly. Idempotent.
    pub fn release(&self, location: &LocationKey) {
        self.in_flight.release(location);
    }

    /// Returns the number of locations with an analysis in progress.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.in_flight_count()
    }

    // Map lock covers only lookup/insert; the limiter has its own lock.
    fn limiter_for(&self, location: &LocationKey) -> Arc<CooldownLimiter> {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Arc::clone(limiters.entry(location.clone()).or_insert_with(|| {
            Arc::new(CooldownLimiter::new(self.cooldown, Arc::clone(&self.clock)))
        }))
    }
}
