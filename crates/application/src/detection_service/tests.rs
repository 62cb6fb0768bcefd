use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use motionwatch_core::{AppError, AppResult, LocationKey};
use motionwatch_domain::{DetectionEvent, DetectionResult, ImageCredentials, SkipReason};

use crate::testing::ManualClock;
use crate::{
    AdmissionController, BackupStore, CooldownLimiter, HomeAutomation, ImageAnalyzer,
    ImageFetcher, NotificationGate, SmsSender,
};

use super::{DetectionOutcome, DetectionService, HomeAutomationSettings};

#[derive(Default)]
struct FakeImageFetcher {
    fail: bool,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

#[async_trait]
impl ImageFetcher for FakeImageFetcher {
    async fn fetch_image(
        &self,
        url: &str,
        credentials: Option<&ImageCredentials>,
    ) -> AppResult<Vec<u8>> {
        self.requests.lock().await.push((
            url.to_owned(),
            credentials.map(|credentials| credentials.username().to_owned()),
        ));
        if self.fail {
            return Err(AppError::Upstream("camera unreachable".to_owned()));
        }

        Ok(vec![0xFF, 0xD8, 0xFF])
    }
}

struct FakeImageAnalyzer {
    answer: AppResult<String>,
    started: Notify,
    gate: Option<Notify>,
}

impl FakeImageAnalyzer {
    fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_owned()),
            started: Notify::new(),
            gate: None,
        }
    }

    fn failing() -> Self {
        Self {
            answer: Err(AppError::Upstream("model overloaded".to_owned())),
            started: Notify::new(),
            gate: None,
        }
    }

    fn blocking(text: &str) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::answering(text)
        }
    }
}

#[async_trait]
impl ImageAnalyzer for FakeImageAnalyzer {
    async fn analyze_image(
        &self,
        _image: &[u8],
        _location: &LocationKey,
    ) -> AppResult<DetectionResult> {
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.answer {
            Ok(text) => Ok(DetectionResult::new(text)),
            Err(error) => Err(AppError::Upstream(error.to_string())),
        }
    }
}

#[derive(Default)]
struct FakeHomeAutomation {
    states: HashMap<String, bool>,
    fail_reads: bool,
    fail_announce: bool,
    announcements: Mutex<Vec<(String, Vec<String>)>>,
    counters: Mutex<Vec<String>>,
    texts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl HomeAutomation for FakeHomeAutomation {
    async fn is_entity_on(&self, entity_id: &str) -> AppResult<bool> {
        if self.fail_reads {
            return Err(AppError::Upstream("hub offline".to_owned()));
        }

        Ok(self.states.get(entity_id).copied().unwrap_or(false))
    }

    async fn announce(&self, message: &str, targets: &[String]) -> AppResult<()> {
        if self.fail_announce {
            return Err(AppError::Upstream("satellite offline".to_owned()));
        }

        self.announcements
            .lock()
            .await
            .push((message.to_owned(), targets.to_vec()));
        Ok(())
    }

    async fn increment_counter(&self, entity_id: &str) -> AppResult<()> {
        self.counters.lock().await.push(entity_id.to_owned());
        Ok(())
    }

    async fn set_input_text(&self, entity_id: &str, value: &str) -> AppResult<()> {
        self.texts
            .lock()
            .await
            .push((entity_id.to_owned(), value.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeSmsSender {
    fail: bool,
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl SmsSender for FakeSmsSender {
    async fn send_sms(&self, message: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Upstream("gateway rejected message".to_owned()));
        }

        self.messages.lock().await.push(message.to_owned());
        Ok(())
    }
}

#[derive(Default)]
struct FakeBackupStore {
    fail: bool,
}

#[async_trait]
impl BackupStore for FakeBackupStore {
    async fn upload_image(
        &self,
        _image: &[u8],
        location: &LocationKey,
        _description: &DetectionResult,
    ) -> AppResult<String> {
        if self.fail {
            return Err(AppError::Upstream("bucket not writable".to_owned()));
        }

        Ok(format!("https://storage.example/{location}.jpg"))
    }
}

fn settings() -> HomeAutomationSettings {
    HomeAutomationSettings {
        announce_targets: vec!["assist_satellite.kitchen".to_owned()],
        voice_enabled_entity: Some("input_boolean.announce".to_owned()),
        home_occupied_entity: Some("binary_sensor.home".to_owned()),
        detection_counter_entity: Some("counter.detections".to_owned()),
        last_detection_entity: Some("input_text.last_detection".to_owned()),
    }
}

fn home(voice_enabled: bool, occupied: bool) -> FakeHomeAutomation {
    FakeHomeAutomation {
        states: HashMap::from([
            ("input_boolean.announce".to_owned(), voice_enabled),
            ("binary_sensor.home".to_owned(), occupied),
        ]),
        ..FakeHomeAutomation::default()
    }
}

fn event(location: &str, ignore_cooldown: bool) -> DetectionEvent {
    let built = DetectionEvent::new(
        LocationKey::new(location),
        "http://camera.local/image.jpg",
        ImageCredentials::from_parts(Some("viewer"), Some("secret")),
        ignore_cooldown,
    );
    assert!(built.is_ok());
    built.unwrap_or_else(|_| unreachable!())
}

fn build_service(
    clock: &ManualClock,
    gate: NotificationGate,
    fetcher: Arc<FakeImageFetcher>,
    analyzer: Arc<FakeImageAnalyzer>,
) -> DetectionService {
    DetectionService::new(
        Arc::new(AdmissionController::new(
            Duration::from_secs(30),
            clock.shared(),
        )),
        Arc::new(gate),
        fetcher,
        analyzer,
    )
}

#[tokio::test]
async fn detection_announces_and_texts_when_nobody_is_home() {
    let clock = ManualClock::new();
    let fetcher = Arc::new(FakeImageFetcher::default());
    let home_automation = Arc::new(home(true, false));
    let sms = Arc::new(FakeSmsSender::default());
    let service = build_service(
        &clock,
        NotificationGate::new(true),
        fetcher.clone(),
        Arc::new(FakeImageAnalyzer::answering("A person is at the door")),
    )
    .with_home_automation(home_automation.clone(), settings())
    .with_sms_sender(sms.clone())
    .with_backup_store(Arc::new(FakeBackupStore::default()));

    let report = service
        .handle_detection_event(event("front_door", false))
        .await;
    assert!(report.is_ok());
    let report = report.unwrap_or_else(|_| unreachable!());

    assert_eq!(report.result_text(), "A person is at the door");
    assert_eq!(report.location.as_str(), "front_door");
    match &report.outcome {
        DetectionOutcome::Analyzed {
            decision,
            backup_url,
            ..
        } => {
            assert!(decision.send_voice && decision.send_sms);
            assert_eq!(
                backup_url.as_deref(),
                Some("https://storage.example/front_door.jpg")
            );
        }
        DetectionOutcome::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
    }

    assert_eq!(
        fetcher.requests.lock().await.as_slice(),
        &[(
            "http://camera.local/image.jpg".to_owned(),
            Some("viewer".to_owned())
        )]
    );
    assert_eq!(
        home_automation.announcements.lock().await.as_slice(),
        &[(
            "front_door: A person is at the door".to_owned(),
            vec!["assist_satellite.kitchen".to_owned()]
        )]
    );
    assert_eq!(
        sms.messages.lock().await.as_slice(),
        &["front_door: A person is at the door https://storage.example/front_door.jpg".to_owned()]
    );
    assert_eq!(
        home_automation.counters.lock().await.as_slice(),
        &["counter.detections".to_owned()]
    );
    assert_eq!(home_automation.texts.lock().await.len(), 1);
    assert_eq!(service.admission().in_flight_count(), 0);
}

#[tokio::test]
async fn nothing_detected_skips_every_notification() {
    let clock = ManualClock::new();
    let home_automation = Arc::new(home(true, false));
    let sms = Arc::new(FakeSmsSender::default());
    let service = build_service(
        &clock,
        NotificationGate::new(true),
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::answering("None")),
    )
    .with_home_automation(home_automation.clone(), settings())
    .with_sms_sender(sms.clone());

    let report = service
        .handle_detection_event(event("back_yard", false))
        .await;
    assert!(report.is_ok());
    assert_eq!(report.unwrap_or_else(|_| unreachable!()).result_text(), "None");

    assert!(home_automation.announcements.lock().await.is_empty());
    assert!(home_automation.counters.lock().await.is_empty());
    assert!(sms.messages.lock().await.is_empty());
}

#[tokio::test]
async fn second_event_within_cooldown_is_skipped() {
    let clock = ManualClock::new();
    let fetcher = Arc::new(FakeImageFetcher::default());
    let service = build_service(
        &clock,
        NotificationGate::new(false),
        fetcher.clone(),
        Arc::new(FakeImageAnalyzer::answering("none")),
    );

    let first = service.handle_detection_event(event("garage", false)).await;
    assert!(first.is_ok());

    clock.advance_secs(10);
    let second = service.handle_detection_event(event("garage", false)).await;
    assert!(second.is_ok());
    let second = second.unwrap_or_else(|_| unreachable!());
    assert_eq!(second.skip_reason(), Some(SkipReason::Cooldown));
    assert_eq!(second.result_text(), "skipped_cooldown");

    let bypass = service.handle_detection_event(event("garage", true)).await;
    assert!(bypass.is_ok());
    assert_eq!(bypass.unwrap_or_else(|_| unreachable!()).skip_reason(), None);
    assert_eq!(fetcher.requests.lock().await.len(), 2);
}

#[tokio::test]
async fn concurrent_event_for_same_location_is_skipped_in_progress() {
    let clock = ManualClock::new();
    let analyzer = Arc::new(FakeImageAnalyzer::blocking("A cat on the porch"));
    let service = build_service(
        &clock,
        NotificationGate::new(false),
        Arc::new(FakeImageFetcher::default()),
        analyzer.clone(),
    );

    let running_service = service.clone();
    let running = tokio::spawn(async move {
        running_service
            .handle_detection_event(event("porch", true))
            .await
    });
    analyzer.started.notified().await;

    let duplicate = service.handle_detection_event(event("porch", true)).await;
    assert!(duplicate.is_ok());
    assert_eq!(
        duplicate.unwrap_or_else(|_| unreachable!()).skip_reason(),
        Some(SkipReason::InProgress)
    );

    if let Some(gate) = &analyzer.gate {
        gate.notify_one();
    }
    let finished = running.await;
    assert!(matches!(finished, Ok(Ok(_))));
    assert_eq!(service.admission().in_flight_count(), 0);
}

#[tokio::test]
async fn fetch_failure_propagates_and_releases_location() {
    let clock = ManualClock::new();
    let service = build_service(
        &clock,
        NotificationGate::new(false),
        Arc::new(FakeImageFetcher {
            fail: true,
            ..FakeImageFetcher::default()
        }),
        Arc::new(FakeImageAnalyzer::answering("none")),
    );

    let report = service.handle_detection_event(event("driveway", false)).await;
    assert!(matches!(report, Err(AppError::Upstream(_))));
    assert_eq!(service.admission().in_flight_count(), 0);

    let retry = service.handle_detection_event(event("driveway", true)).await;
    assert!(matches!(retry, Err(AppError::Upstream(_))));
}

#[tokio::test]
async fn analysis_failure_propagates_and_releases_location() {
    let clock = ManualClock::new();
    let service = build_service(
        &clock,
        NotificationGate::new(false),
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::failing()),
    );

    let report = service.handle_detection_event(event("driveway", false)).await;
    assert!(report.is_err());
    assert_eq!(service.admission().in_flight_count(), 0);
}

#[tokio::test]
async fn notification_failures_never_fail_the_request() {
    let clock = ManualClock::new();
    let service = build_service(
        &clock,
        NotificationGate::new(true),
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::answering("Two people by the car")),
    )
    .with_home_automation(
        Arc::new(FakeHomeAutomation {
            fail_announce: true,
            ..home(true, false)
        }),
        settings(),
    )
    .with_sms_sender(Arc::new(FakeSmsSender {
        fail: true,
        ..FakeSmsSender::default()
    }))
    .with_backup_store(Arc::new(FakeBackupStore { fail: true }));

    let report = service.handle_detection_event(event("driveway", false)).await;
    assert!(report.is_ok());
    match report.unwrap_or_else(|_| unreachable!()).outcome {
        DetectionOutcome::Analyzed { backup_url, .. } => assert!(backup_url.is_none()),
        DetectionOutcome::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
    }
}

#[tokio::test]
async fn unreadable_toggles_default_to_off() {
    let clock = ManualClock::new();
    let home_automation = Arc::new(FakeHomeAutomation {
        fail_reads: true,
        ..FakeHomeAutomation::default()
    });
    let sms = Arc::new(FakeSmsSender::default());
    let service = build_service(
        &clock,
        NotificationGate::new(true),
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::answering("A fox in the garden")),
    )
    .with_home_automation(home_automation.clone(), settings())
    .with_sms_sender(sms.clone());

    let report = service.handle_detection_event(event("garden", false)).await;
    assert!(report.is_ok());

    // Voice toggle read fails -> no announcement; occupancy read fails -> treated as empty home.
    assert!(home_automation.announcements.lock().await.is_empty());
    assert_eq!(
        sms.messages.lock().await.as_slice(),
        &["garden: A fox in the garden".to_owned()]
    );
}

#[tokio::test]
async fn occupied_home_suppresses_sms_but_not_voice() {
    let clock = ManualClock::new();
    let home_automation = Arc::new(home(true, true));
    let sms = Arc::new(FakeSmsSender::default());
    let service = build_service(
        &clock,
        NotificationGate::new(true),
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::answering("A parcel was dropped off")),
    )
    .with_home_automation(home_automation.clone(), settings())
    .with_sms_sender(sms.clone());

    let report = service.handle_detection_event(event("front_door", false)).await;
    assert!(report.is_ok());

    assert_eq!(home_automation.announcements.lock().await.len(), 1);
    assert!(sms.messages.lock().await.is_empty());
}

#[tokio::test]
async fn voice_channel_cooldown_spans_locations() {
    let clock = ManualClock::new();
    let home_automation = Arc::new(home(true, false));
    let gate = NotificationGate::new(false)
        .with_voice_limiter(CooldownLimiter::new(Duration::from_secs(60), clock.shared()));
    let service = build_service(
        &clock,
        gate,
        Arc::new(FakeImageFetcher::default()),
        Arc::new(FakeImageAnalyzer::answering("Someone walked past")),
    )
    .with_home_automation(home_automation.clone(), settings());

    assert!(service.handle_detection_event(event("front_door", false)).await.is_ok());
    clock.advance_secs(5);
    assert!(service.handle_detection_event(event("back_yard", false)).await.is_ok());

    assert_eq!(home_automation.announcements.lock().await.len(), 1);
    assert_eq!(home_automation.counters.lock().await.len(), 2);
}
