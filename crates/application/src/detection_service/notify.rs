use motionwatch_core::LocationKey;
use motionwatch_domain::{
    DetectionResult, NotificationChannel, NotificationDecision, announcement_message,
};
use tracing::{info, warn};

use super::DetectionService;

impl DetectionService {
    pub(super) async fn voice_enabled(&self) -> bool {
        if self.home_automation.is_none()
            || self.home_automation_settings.announce_targets.is_empty()
        {
            return false;
        }

        let entity = self.home_automation_settings.voice_enabled_entity.as_deref();
        self.read_toggle(entity, true).await
    }

    pub(super) async fn home_occupied(&self) -> bool {
        let entity = self.home_automation_settings.home_occupied_entity.as_deref();
        self.read_toggle(entity, false).await
    }

    // Unset entity yields `when_unset`; any lookup failure yields `false`.
    async fn read_toggle(&self, entity_id: Option<&str>, when_unset: bool) -> bool {
        let Some(entity_id) = entity_id else {
            return when_unset;
        };
        let Some(home_automation) = &self.home_automation else {
            return false;
        };

        match home_automation.is_entity_on(entity_id).await {
            Ok(state) => state,
            Err(error) => {
                warn!(entity_id, error = %error, "failed to read home automation state");
                false
            }
        }
    }

    pub(super) async fn backup_image(
        &self,
        image: &[u8],
        location: &LocationKey,
        result: &DetectionResult,
    ) -> Option<String> {
        let backup_store = self.backup_store.as_ref()?;

        match backup_store.upload_image(image, location, result).await {
            Ok(url) => {
                info!(backup_url = %url, "snapshot backed up");
                Some(url)
            }
            Err(error) => {
                warn!(error = %error, "snapshot backup failed");
                None
            }
        }
    }

    pub(super) async fn deliver_notifications(
        &self,
        location: &LocationKey,
        result: &DetectionResult,
        decision: NotificationDecision,
        backup_url: Option<&str>,
    ) {
        let message = announcement_message(location, result);

        if decision.allows(NotificationChannel::Voice) {
            if let Some(home_automation) = &self.home_automation {
                let targets = &self.home_automation_settings.announce_targets;
                match home_automation.announce(&message, targets).await {
                    Ok(()) => info!(message = %message, "announcement sent"),
                    Err(error) => warn!(error = %error, "announcement failed"),
                }
            }
        }

        if decision.allows(NotificationChannel::Sms) {
            let Some(sms_sender) = &self.sms_sender else {
                warn!("sms selected but no sms transport is configured");
                return;
            };

            let text = match backup_url {
                Some(url) => format!("{message} {url}"),
                None => message,
            };
            match sms_sender.send_sms(&text).await {
                Ok(()) => info!("sms sent"),
                Err(error) => warn!(error = %error, "sms delivery failed"),
            }
        }
    }

    pub(super) async fn record_detection(&self, location: &LocationKey, result: &DetectionResult) {
        let Some(home_automation) = &self.home_automation else {
            return;
        };
        let settings = &self.home_automation_settings;

        if let Some(counter) = settings.detection_counter_entity.as_deref() {
            if let Err(error) = home_automation.increment_counter(counter).await {
                warn!(entity_id = counter, error = %error, "failed to increment detection counter");
            }
        }

        if let Some(text_entity) = settings.last_detection_entity.as_deref() {
            let message = announcement_message(location, result);
            if let Err(error) = home_automation.set_input_text(text_entity, &message).await {
                warn!(entity_id = text_entity, error = %error, "failed to store last detection");
            }
        }
    }
}
