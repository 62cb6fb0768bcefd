use std::sync::Arc;

use motionwatch_application::{
    AdmissionController, CooldownLimiter, DetectionService, ImageFetcher, NotificationGate,
};
use motionwatch_core::AppError;
use motionwatch_infrastructure::{
    CallMeBotSmsSender, DebugSnapshotImageFetcher, GcsBackupStore, GeminiImageAnalyzer,
    HomeAssistantClient, HttpImageFetcher, LOCATION_PLACEHOLDER, SystemClock,
};
use tracing::{info, warn};

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(concat!("motionwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))
}

pub async fn load_prompt_template(config: &ApiConfig) -> Result<String, AppError> {
    let template = tokio::fs::read_to_string(&config.system_prompt_path)
        .await
        .map_err(|error| {
            AppError::Validation(format!(
                "failed to read system prompt '{}': {error}",
                config.system_prompt_path.display()
            ))
        })?;

    if !template.contains(LOCATION_PLACEHOLDER) {
        warn!(
            path = %config.system_prompt_path.display(),
            "system prompt has no {LOCATION_PLACEHOLDER} placeholder"
        );
    }

    Ok(template)
}

pub fn build_gemini_analyzer(
    config: &ApiConfig,
    http_client: reqwest::Client,
    prompt_template: String,
) -> GeminiImageAnalyzer {
    GeminiImageAnalyzer::new(
        http_client,
        config.gemini.base_url.clone(),
        config.gemini.api_key.clone(),
        config.gemini.model.clone(),
        prompt_template,
        config.gemini.timeout,
    )
}

pub fn build_app_state(
    config: &ApiConfig,
    http_client: reqwest::Client,
    prompt_template: String,
) -> AppState {
    let clock = Arc::new(SystemClock);

    let mut gate = NotificationGate::new(config.sms.is_some());
    if let Some(cooldown) = config.voice_cooldown {
        gate = gate.with_voice_limiter(CooldownLimiter::new(cooldown, clock.clone()));
    }
    if let Some(cooldown) = config.sms_cooldown {
        gate = gate.with_sms_limiter(CooldownLimiter::new(cooldown, clock.clone()));
    }

    let mut image_fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(
        http_client.clone(),
        config.image_fetch_timeout,
    ));
    if let Some(path) = &config.debug_image_path {
        image_fetcher = Arc::new(DebugSnapshotImageFetcher::new(image_fetcher, path.clone()));
    }

    let mut detection_service = DetectionService::new(
        Arc::new(AdmissionController::new(config.location_cooldown, clock)),
        Arc::new(gate),
        image_fetcher,
        Arc::new(build_gemini_analyzer(
            config,
            http_client.clone(),
            prompt_template,
        )),
    );

    if let Some(home_assistant) = &config.home_assistant {
        detection_service = detection_service.with_home_automation(
            Arc::new(HomeAssistantClient::new(
                http_client.clone(),
                home_assistant.url.clone(),
                home_assistant.token.clone(),
            )),
            home_assistant.settings.clone(),
        );
    }

    if let Some(sms) = &config.sms {
        detection_service = detection_service.with_sms_sender(Arc::new(CallMeBotSmsSender::new(
            http_client.clone(),
            sms.api_url.clone(),
            sms.phone.clone(),
            sms.api_key.clone(),
        )));
    }

    if let Some(gcs) = &config.gcs {
        detection_service = detection_service.with_backup_store(Arc::new(GcsBackupStore::new(
            http_client,
            gcs.bucket.clone(),
            gcs.access_token.clone(),
        )));
    }

    info!(
        model = %config.gemini.model,
        cooldown_secs = config.location_cooldown.as_secs(),
        home_assistant = config.home_assistant.is_some(),
        sms = config.sms.is_some(),
        backup = config.gcs.is_some(),
        "detection service configured"
    );

    AppState { detection_service }
}
