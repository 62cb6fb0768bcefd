use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};
use motionwatch_core::{AppError, AppResult};
use serde_json::{Map, Value};
use tracing::info;

use crate::dto::{MotionRequest, MotionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn motion_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<MotionResponse>> {
    let request = parse_motion_request(&method, uri.query(), &headers, &body)?;
    info!(
        location = request.location.as_deref().unwrap_or_default(),
        has_image_url = request.image_url().is_some(),
        ignore_cooldown = request.ignore_cooldown,
        "motion request received"
    );

    let event = request.into_event()?;
    let report = state.detection_service.handle_detection_event(event).await?;

    Ok(Json(MotionResponse::from(report)))
}

/// Reads the webhook fields from the query string (GET or empty body), a JSON
/// body, or an URL-encoded form.
pub fn parse_motion_request(
    method: &Method,
    query: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> AppResult<MotionRequest> {
    if method == Method::GET || body.iter().all(u8::is_ascii_whitespace) {
        return from_form_pairs(query.unwrap_or_default().as_bytes());
    }

    if declares_json(headers) {
        return serde_json::from_slice(body)
            .map_err(|error| AppError::Validation(format!("invalid JSON body: {error}")));
    }

    match serde_json::from_slice(body) {
        Ok(request) => Ok(request),
        Err(_) => from_form_pairs(body),
    }
}

fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

fn from_form_pairs(encoded: &[u8]) -> AppResult<MotionRequest> {
    let fields: Map<String, Value> = url::form_urlencoded::parse(encoded)
        .into_owned()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    serde_json::from_value(Value::Object(fields))
        .map_err(|error| AppError::Validation(format!("invalid form fields: {error}")))
}
