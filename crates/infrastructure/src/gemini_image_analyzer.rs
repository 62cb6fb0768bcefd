use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use motionwatch_application::ImageAnalyzer;
use motionwatch_core::{AppError, AppResult, LocationKey};
use motionwatch_domain::DetectionResult;
use serde::{Deserialize, Serialize};

use crate::http_support::send_checked;

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_CONTENT: &str = "generateContent";

/// Placeholder replaced by the camera location in the prompt template.
pub const LOCATION_PLACEHOLDER: &str = "{location}";

/// Vision-model analyzer backed by the Gemini `generateContent` REST API.
pub struct GeminiImageAnalyzer {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt_template: String,
    timeout: Duration,
}

/// Model entry returned by [`GeminiImageAnalyzer::list_models`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    /// Resource name, e.g. `models/gemini-2.0-flash`.
    pub name: String,
    /// Human readable name.
    #[serde(default)]
    pub display_name: String,
    /// Methods the model can be called with.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl GeminiModel {
    /// Returns whether the model can analyze images through `generateContent`.
    #[must_use]
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == GENERATE_CONTENT)
    }
}

impl GeminiImageAnalyzer {
    /// Creates a Gemini analyzer.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        prompt_template: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
            prompt_template: prompt_template.into(),
            timeout,
        }
    }

    /// Lists every model that supports `generateContent`, following pagination.
    pub async fn list_models(&self) -> AppResult<Vec<GeminiModel>> {
        let endpoint = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = url::Url::parse(&endpoint)
                .map_err(|error| AppError::Internal(format!("invalid model list url: {error}")))?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let request = self
                .http_client
                .get(url)
                .header(API_KEY_HEADER, &self.api_key)
                .timeout(self.timeout);
            let page: ListModelsResponse = send_checked(request, "gemini model listing")
                .await?
                .json()
                .await
                .map_err(|error| {
                    AppError::Upstream(format!("gemini model listing was not valid json: {error}"))
                })?;

            models.extend(
                page.models
                    .into_iter()
                    .filter(GeminiModel::supports_generate_content),
            );

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(models),
            }
        }
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:{GENERATE_CONTENT}",
            self.base_url, self.model
        )
    }
}

/// Substitutes the camera location into a prompt template.
#[must_use]
pub fn render_prompt(template: &str, location: &LocationKey) -> String {
    template.replace(LOCATION_PLACEHOLDER, location.as_str())
}

#[async_trait]
impl ImageAnalyzer for GeminiImageAnalyzer {
    async fn analyze_image(
        &self,
        image: &[u8],
        location: &LocationKey,
    ) -> AppResult<DetectionResult> {
        let prompt = render_prompt(&self.prompt_template, location);
        let body = GenerateContentRequest::for_jpeg(&prompt, image);

        let request = self
            .http_client
            .post(self.generate_content_url())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(&body);

        let response: GenerateContentResponse = send_checked(request, "gemini analysis")
            .await?
            .json()
            .await
            .map_err(|error| {
                AppError::Upstream(format!("gemini analysis was not valid json: {error}"))
            })?;

        response.into_result()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    fn for_jpeg(prompt: &'a str, image: &[u8]) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Text { text: prompt },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: STANDARD.encode(image),
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_result(self) -> AppResult<DetectionResult> {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "empty response".to_owned());
            return Err(AppError::Upstream(format!(
                "gemini returned no text: {reason}"
            )));
        }

        Ok(DetectionResult::new(text))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use motionwatch_application::ImageAnalyzer;
    use motionwatch_core::{AppError, LocationKey};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{GenerateContentRequest, GenerateContentResponse, GeminiImageAnalyzer, render_prompt};

    fn analyzer(server: &MockServer) -> GeminiImageAnalyzer {
        GeminiImageAnalyzer::new(
            reqwest::Client::new(),
            format!("{}/", server.uri()),
            "test-key",
            "gemini-2.0-flash-exp",
            "Camera at {location}. Describe people or vehicles, else answer none.",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn prompt_template_receives_location() {
        let prompt = render_prompt("Camera {location}, look at {location}", &LocationKey::new("porch"));
        assert_eq!(prompt, "Camera porch, look at porch");
    }

    #[test]
    fn request_carries_prompt_and_base64_jpeg() {
        let body = GenerateContentRequest::for_jpeg("describe", &[0xFF, 0xD8, 0xFF]);
        let value = serde_json::to_value(&body).unwrap_or_default();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(
            value["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["data"], "/9j/");
    }

    #[test]
    fn response_text_parts_are_joined_and_trimmed() {
        let response: Result<GenerateContentResponse, _> = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "A person " }, { "text": "at the gate\n" }] }
            }]
        }));
        assert!(response.is_ok());
        let result = response.unwrap_or_else(|_| unreachable!()).into_result();

        assert!(result.is_ok());
        assert_eq!(
            result.unwrap_or_else(|_| unreachable!()).as_str(),
            "A person at the gate"
        );
    }

    #[test]
    fn blocked_prompt_is_upstream_error() {
        let response: Result<GenerateContentResponse, _> = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }));
        assert!(response.is_ok());
        let result = response.unwrap_or_else(|_| unreachable!()).into_result();

        assert!(matches!(result, Err(AppError::Upstream(message)) if message.contains("SAFETY")));
    }

    #[tokio::test]
    async fn analyze_image_posts_to_model_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "candidates": [{ "content": { "parts": [{ "text": "none" }] } }] }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let result = analyzer(&server)
            .analyze_image(&[1, 2, 3], &LocationKey::new("driveway"))
            .await;
        assert!(result.is_ok());
        assert!(result.unwrap_or_else(|_| unreachable!()).is_nothing_detected());

        let requests = server.received_requests().await.unwrap_or_default();
        let body: serde_json::Value = requests[0].body_json().unwrap_or_default();
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Camera at driveway. Describe people or vehicles, else answer none."
        );
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
    }

    #[tokio::test]
    async fn model_errors_surface_as_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "error": { "message": "overloaded" } })),
            )
            .mount(&server)
            .await;

        let result = analyzer(&server)
            .analyze_image(&[1], &LocationKey::unknown())
            .await;
        assert!(matches!(result, Err(AppError::Upstream(message)) if message.contains("503")));
    }

    #[tokio::test]
    async fn list_models_keeps_generate_content_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {
                        "name": "models/gemini-2.0-flash",
                        "displayName": "Gemini 2.0 Flash",
                        "supportedGenerationMethods": ["generateContent", "countTokens"]
                    },
                    {
                        "name": "models/text-embedding-004",
                        "displayName": "Text Embedding 004",
                        "supportedGenerationMethods": ["embedContent"]
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let models = analyzer(&server).list_models().await;
        assert!(models.is_ok());
        let models = models.unwrap_or_default();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "models/gemini-2.0-flash");
        assert_eq!(models[0].display_name, "Gemini 2.0 Flash");
    }

    #[tokio::test]
    async fn list_models_follows_page_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{
                    "name": "models/gemini-1.5-pro",
                    "supportedGenerationMethods": ["generateContent"]
                }]
            })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{
                    "name": "models/gemini-2.0-flash",
                    "supportedGenerationMethods": ["generateContent"]
                }],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let models = analyzer(&server).list_models().await.unwrap_or_default();
        let names: Vec<&str> = models.iter().map(|model| model.name.as_str()).collect();
        assert_eq!(names, vec!["models/gemini-2.0-flash", "models/gemini-1.5-pro"]);
    }
}
