use std::time::Duration;

use async_trait::async_trait;
use motionwatch_application::HomeAutomation;
use motionwatch_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http_support::send_checked;

const STATE_TIMEOUT: Duration = Duration::from_secs(5);
const SERVICE_TIMEOUT: Duration = Duration::from_secs(5);
const ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Home Assistant REST API client authenticated with a long-lived token.
pub struct HomeAssistantClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct EntityState {
    #[serde(default)]
    state: String,
}

impl HomeAssistantClient {
    /// Creates a client for the instance at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> AppResult<()> {
        let request = self
            .http_client
            .post(format!("{}/api/services/{domain}/{service}", self.base_url))
            .bearer_auth(&self.token)
            .timeout(timeout)
            .json(&payload);

        send_checked(request, &format!("home assistant {domain}.{service}")).await?;
        debug!(domain, service, "home assistant service called");
        Ok(())
    }
}

#[async_trait]
impl HomeAutomation for HomeAssistantClient {
    async fn is_entity_on(&self, entity_id: &str) -> AppResult<bool> {
        let request = self
            .http_client
            .get(format!("{}/api/states/{entity_id}", self.base_url))
            .bearer_auth(&self.token)
            .timeout(STATE_TIMEOUT);

        let entity: EntityState = send_checked(request, "home assistant state lookup")
            .await?
            .json()
            .await
            .map_err(|error| {
                AppError::Upstream(format!(
                    "home assistant state for '{entity_id}' was not valid json: {error}"
                ))
            })?;

        Ok(entity.state.eq_ignore_ascii_case("on"))
    }

    async fn announce(&self, message: &str, targets: &[String]) -> AppResult<()> {
        self.call_service(
            "assist_satellite",
            "announce",
            json!({ "entity_id": targets, "message": message }),
            ANNOUNCE_TIMEOUT,
        )
        .await
    }

    async fn increment_counter(&self, entity_id: &str) -> AppResult<()> {
        self.call_service(
            "counter",
            "increment",
            json!({ "entity_id": entity_id }),
            SERVICE_TIMEOUT,
        )
        .await
    }

    async fn set_input_text(&self, entity_id: &str, value: &str) -> AppResult<()> {
        self.call_service(
            "input_text",
            "set_value",
            json!({ "entity_id": entity_id, "value": value }),
            SERVICE_TIMEOUT,
        )
        .await
    }
}
