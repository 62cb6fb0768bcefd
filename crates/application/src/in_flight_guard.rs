//! Per-location de-duplication of in-progress analyses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use motionwatch_core::LocationKey;
use tracing::debug;

#[derive(Default)]
struct InFlightState {
    holders: Mutex<HashMap<LocationKey, u64>>,
    next_token: AtomicU64,
}

/// Set of locations that currently have an admitted, unreleased analysis.
///
/// Clones share the same set.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    state: Arc<InFlightState>,
}

impl InFlightGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `location` as in flight unless it already is.
    ///
    /// The returned permit releases the location when dropped.
    #[must_use]
    pub fn try_acquire(&self, location: &LocationKey) -> Option<InFlightPermit> {
        let mut holders = self.holders();
        if holders.contains_key(location) {
            return None;
        }

        let token = self.state.next_token.fetch_add(1, Ordering::Relaxed);
        holders.insert(location.clone(), token);

        Some(InFlightPermit {
            guard: self.clone(),
            location: location.clone(),
            token,
        })
    }

    /// Removes `location` from the set. Releasing an absent location is a no-op.
    pub fn release(&self, location: &LocationKey) {
        if self.holders().remove(location).is_some() {
            debug!(location = %location, "in-flight marker released");
        }
    }

    /// Returns whether `location` is currently in flight.
    #[must_use]
    pub fn is_in_flight(&self, location: &LocationKey) -> bool {
        self.holders().contains_key(location)
    }

    /// Returns the number of locations currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.holders().len()
    }

    // Compare-and-delete so a stale permit never frees a newer holder's marker.
    fn release_token(&self, location: &LocationKey, token: u64) {
        let mut holders = self.holders();
        if holders.get(location) == Some(&token) {
            holders.remove(location);
            debug!(location = %location, "in-flight marker released");
        }
    }

    fn holders(&self) -> MutexGuard<'_, HashMap<LocationKey, u64>> {
        self.state
            .holders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped claim on one in-flight location.
#[must_use = "dropping the permit releases the location immediately"]
pub struct InFlightPermit {
    guard: InFlightGuard,
    location: LocationKey,
    token: u64,
}

impl InFlightPermit {
    /// Returns the claimed location.
    #[must_use]
    pub fn location(&self) -> &LocationKey {
        &self.location
    }
}

impl std::fmt::Debug for InFlightPermit {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("InFlightPermit")
            .field("location", &self.location)
            .field("token", &self.token)
            .finish()
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.guard.release_token(&self.location, self.token);
    }
}
