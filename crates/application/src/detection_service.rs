use std::sync::Arc;

use motionwatch_core::AppResult;
use motionwatch_domain::{DetectionEvent, NotificationDecision, SkipReason};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::{
    Admission, AdmissionController, BackupStore, HomeAutomation, ImageAnalyzer, ImageFetcher,
    NotificationGate, SmsSender,
};

mod config;
mod notify;
mod report;

#[cfg(test)]
mod tests;

pub use config::HomeAutomationSettings;
pub use report::{DetectionOutcome, DetectionReport};

/// Handles motion webhook events end to end.
#[derive(Clone)]
pub struct DetectionService {
    admission: Arc<AdmissionController>,
    gate: Arc<NotificationGate>,
    image_fetcher: Arc<dyn ImageFetcher>,
    image_analyzer: Arc<dyn ImageAnalyzer>,
    home_automation: Option<Arc<dyn HomeAutomation>>,
    home_automation_settings: HomeAutomationSettings,
    sms_sender: Option<Arc<dyn SmsSender>>,
    backup_store: Option<Arc<dyn BackupStore>>,
}

impl DetectionService {
    /// Creates a detection service without notification collaborators.
    #[must_use]
    pub fn new(
        admission: Arc<AdmissionController>,
        gate: Arc<NotificationGate>,
        image_fetcher: Arc<dyn ImageFetcher>,
        image_analyzer: Arc<dyn ImageAnalyzer>,
    ) -> Self {
        Self {
            admission,
            gate,
            image_fetcher,
            image_analyzer,
            home_automation: None,
            home_automation_settings: HomeAutomationSettings::default(),
            sms_sender: None,
            backup_store: None,
        }
    }

    /// Adds the home-automation hub for toggles, announcements and counters.
    #[must_use]
    pub fn with_home_automation(
        mut self,
        home_automation: Arc<dyn HomeAutomation>,
        settings: HomeAutomationSettings,
    ) -> Self {
        self.home_automation = Some(home_automation);
        self.home_automation_settings = settings;
        self
    }

    /// Adds the SMS transport.
    #[must_use]
    pub fn with_sms_sender(mut self, sms_sender: Arc<dyn SmsSender>) -> Self {
        self.sms_sender = Some(sms_sender);
        self
    }

    /// Adds off-site snapshot backup.
    #[must_use]
    pub fn with_backup_store(mut self, backup_store: Arc<dyn BackupStore>) -> Self {
        self.backup_store = Some(backup_store);
        self
    }

    /// Returns the admission controller shared with the HTTP layer.
    #[must_use]
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Admits, analyzes and notifies for one motion event.
    ///
    /// Skips are reported as successful outcomes. Fetch and analysis failures
    /// are returned as errors once the location has been released.
    pub async fn handle_detection_event(&self, event: DetectionEvent) -> AppResult<DetectionReport> {
        let event_id = Uuid::new_v4();
        let span = info_span!("detection", %event_id, location = %event.location());

        self.handle_admitted_event(event_id, event)
            .instrument(span)
            .await
    }

    async fn handle_admitted_event(
        &self,
        event_id: Uuid,
        event: DetectionEvent,
    ) -> AppResult<DetectionReport> {
        let location = event.location().clone();

        // Held until this function returns, whichever way it returns.
        let _permit = match self.admission.admit(&location, event.ignore_cooldown()) {
            Admission::Admitted(permit) => permit,
            Admission::SkippedCooldown => {
                info!("skipping location in cooldown period");
                return Ok(DetectionReport::new(
                    event_id,
                    location,
                    DetectionOutcome::Skipped(SkipReason::Cooldown),
                ));
            }
            Admission::SkippedInProgress => {
                info!("skipping location, analysis already in progress");
                return Ok(DetectionReport::new(
                    event_id,
                    location,
                    DetectionOutcome::Skipped(SkipReason::InProgress),
                ));
            }
        };

        info!(image_url = %event.image_url(), "fetching image");
        let image = self
            .image_fetcher
            .fetch_image(event.image_url(), event.credentials())
            .await?;

        info!(image_bytes = image.len(), "analyzing image");
        let result = self.image_analyzer.analyze_image(&image, &location).await?;
        info!(result = %result, "analysis completed");

        if result.is_nothing_detected() {
            return Ok(DetectionReport::new(
                event_id,
                location,
                DetectionOutcome::Analyzed {
                    result,
                    decision: NotificationDecision::silent(),
                    backup_url: None,
                },
            ));
        }

        let voice_enabled = self.voice_enabled().await;
        let home_occupied = self.home_occupied().await;
        let decision = self.gate.decide(&result, voice_enabled, home_occupied);
        info!(
            voice_enabled,
            home_occupied,
            send_voice = decision.send_voice,
            send_sms = decision.send_sms,
            "notification decision"
        );

        let backup_url = self.backup_image(&image, &location, &result).await;
        self.deliver_notifications(&location, &result, decision, backup_url.as_deref())
            .await;
        self.record_detection(&location, &result).await;

        Ok(DetectionReport::new(
            event_id,
            location,
            DetectionOutcome::Analyzed {
                result,
                decision,
                backup_url,
            },
        ))
    }
}
