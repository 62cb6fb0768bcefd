use std::time::Instant;

/// Monotonic time source shared by every cooldown limiter.
pub trait Clock: Send + Sync {
    /// Returns the current instant. Successive calls never go backwards.
    fn now(&self) -> Instant;
}
