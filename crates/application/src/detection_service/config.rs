/// Home-automation entities used around one detection.
#[derive(Debug, Clone, Default)]
pub struct HomeAutomationSettings {
    /// Satellite entities that speak announcements.
    pub announce_targets: Vec<String>,
    /// Toggle enabling voice announcements. Unset means always enabled.
    pub voice_enabled_entity: Option<String>,
    /// Occupancy sensor suppressing SMS. Unset means nobody is home.
    pub home_occupied_entity: Option<String>,
    /// Counter incremented for every detection.
    pub detection_counter_entity: Option<String>,
    /// Text input holding the latest detection message.
    pub last_detection_entity: Option<String>,
}
