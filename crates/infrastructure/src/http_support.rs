use motionwatch_core::{AppError, AppResult};

/// Turns transport failures and non-2xx answers into [`AppError::Upstream`].
pub(crate) async fn send_checked(
    request: reqwest::RequestBuilder,
    operation: &str,
) -> AppResult<reqwest::Response> {
    let response = request
        .send()
        .await
        .map_err(|error| AppError::Upstream(format!("{operation} transport error: {error}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    Err(AppError::Upstream(format!(
        "{operation} failed with status {status}: {body}"
    )))
}
