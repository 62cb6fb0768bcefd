//! Domain values for motion detection events and their outcomes.

#![forbid(unsafe_code)]

mod admission;
mod detection;
mod notification;

pub use admission::{AdmissionOutcome, SkipReason};
pub use detection::{DetectionEvent, DetectionResult, ImageCredentials};
pub use notification::{NotificationChannel, NotificationDecision, announcement_message};
