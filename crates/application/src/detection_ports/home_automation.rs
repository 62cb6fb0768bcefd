use async_trait::async_trait;
use motionwatch_core::AppResult;

/// Port for the home-automation hub.
#[async_trait]
pub trait HomeAutomation: Send + Sync {
    /// Returns whether a boolean entity is currently `on`.
    ///
    /// The hub is treated as unreliable; callers fall back to `false` on error.
    async fn is_entity_on(&self, entity_id: &str) -> AppResult<bool>;

    /// Speaks a message on the given satellite entities.
    async fn announce(&self, message: &str, targets: &[String]) -> AppResult<()>;

    /// Increments a counter entity.
    async fn increment_counter(&self, entity_id: &str) -> AppResult<()>;

    /// Sets the value of a text input entity.
    async fn set_input_text(&self, entity_id: &str, value: &str) -> AppResult<()>;
}
