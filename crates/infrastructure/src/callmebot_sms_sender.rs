use std::time::Duration;

use async_trait::async_trait;
use motionwatch_application::SmsSender;
use motionwatch_core::{AppError, AppResult};

use crate::http_support::send_checked;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Text messages through the CallMeBot gateway.
pub struct CallMeBotSmsSender {
    http_client: reqwest::Client,
    api_url: String,
    phone: String,
    api_key: String,
}

impl CallMeBotSmsSender {
    /// Creates a sender for one recipient.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        api_url: impl Into<String>,
        phone: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into(),
            phone: phone.into(),
            api_key: api_key.into(),
        }
    }

    fn message_url(&self, message: &str) -> AppResult<url::Url> {
        url::Url::parse_with_params(
            &self.api_url,
            &[
                ("phone", self.phone.as_str()),
                ("text", message),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|error| AppError::Internal(format!("invalid sms gateway url: {error}")))
    }
}

#[async_trait]
impl SmsSender for CallMeBotSmsSender {
    async fn send_sms(&self, message: &str) -> AppResult<()> {
        let request = self
            .http_client
            .get(self.message_url(message)?)
            .timeout(SEND_TIMEOUT);

        send_checked(request, "sms gateway").await?;
        Ok(())
    }
}
