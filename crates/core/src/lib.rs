//! Shared primitives for all Rust crates in motionwatch.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across motionwatch crates.
pub type AppResult<T> = Result<T, AppError>;

/// Identifier of a camera location as sent by the webhook caller.
///
/// Keys are opaque and case-sensitive. No normalization is applied apart from
/// mapping an absent or empty value to [`LocationKey::UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey(String);

impl LocationKey {
    /// Sentinel used when the caller did not name a location.
    pub const UNKNOWN: &'static str = "unknown";

    /// Creates a location key, falling back to the sentinel for empty input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return Self::unknown();
        }

        Self(value)
    }

    /// Creates a location key from an optional transport value.
    #[must_use]
    pub fn from_optional(value: Option<&str>) -> Self {
        value.map_or_else(Self::unknown, Self::new)
    }

    /// Returns the sentinel location key.
    #[must_use]
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_owned())
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for LocationKey {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Display for LocationKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<LocationKey> for String {
    fn from(value: LocationKey) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A third-party call (camera, model, home automation, storage) failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
