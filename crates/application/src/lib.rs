//! Application services and ports.

#![forbid(unsafe_code)]

mod admission_controller;
mod cooldown_limiter;
mod detection_ports;
mod detection_service;
mod in_flight_guard;
mod notification_gate;

#[cfg(test)]
mod testing;

pub use admission_controller::{Admission, AdmissionController};
pub use cooldown_limiter::CooldownLimiter;
pub use detection_ports::{
    BackupStore, Clock, HomeAutomation, ImageAnalyzer, ImageFetcher, SmsSender,
};
pub use detection_service::{
    DetectionOutcome, DetectionReport, DetectionService, HomeAutomationSettings,
};
pub use in_flight_guard::{InFlightGuard, InFlightPermit};
pub use notification_gate::NotificationGate;
