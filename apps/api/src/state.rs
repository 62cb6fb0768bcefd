use motionwatch_application::DetectionService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub detection_service: DetectionService,
}
