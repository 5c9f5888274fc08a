//! LLM Client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! Handlers depend on the `TextGenerator` trait; `LlmClient` is its production implementation.
//!
//! Model: gemini-1.5-pro (hardcoded, not configurable)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-1.5-pro";
const MAX_OUTPUT_TOKENS: u32 = 2048;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that can turn a prompt into free text. Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// One entry of the `models.list` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Wraps the Gemini REST API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Makes a raw `generateContent` call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, MODEL);
        let request_body = GenerateRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Lists every model visible to the configured API key, following pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("x-goog-api-key", &self.api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let page: ModelList = response.json().await?;
            models.extend(page.models);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response.text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!("Gemini returned no text (finish reason: {reason})");
            LlmError::EmptyContent
        })
    }
}

/// Pulls `error.message` out of a Gemini error body, falling back to the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode, Uri},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    const TEST_KEY: &str = "test-key";

    /// Fails the first `failures` calls with `failure_status`, then answers normally.
    #[derive(Clone)]
    struct GeminiStub {
        attempts: Arc<AtomicUsize>,
        failures: usize,
        failure_status: StatusCode,
    }

    impl GeminiStub {
        fn new(failures: usize, failure_status: StatusCode) -> Self {
            Self {
                attempts: Arc::new(AtomicUsize::new(0)),
                failures,
                failure_status,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    async fn generate_content(
        State(stub): State<GeminiStub>,
        headers: HeaderMap,
        uri: Uri,
    ) -> Response {
        if uri.path() != format!("/models/{MODEL}:generateContent") {
            return StatusCode::NOT_FOUND.into_response();
        }
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        let attempt = stub.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < stub.failures {
            let body = json!({"error": {"code": stub.failure_status.as_u16(), "message": "try again later"}});
            return (stub.failure_status, Json(body)).into_response();
        }
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": "## Strengths\n- Consistent"}]}}]
        }))
        .into_response()
    }

    async fn list_models_page(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        match params.get("pageToken").map(String::as_str) {
            None => Json(json!({
                "models": [{"name": "models/gemini-1.5-pro", "supportedGenerationMethods": ["generateContent"]}],
                "nextPageToken": "page-2"
            })),
            Some(_) => Json(json!({
                "models": [{"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}]
            })),
        }
    }

    async fn serve(stub: GeminiStub) -> String {
        let router = Router::new()
            .route("/models", get(list_models_page))
            .fallback(generate_content)
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/")
    }

    fn client_for(base_url: String) -> LlmClient {
        LlmClient::new(TEST_KEY.to_string()).with_base_url(base_url)
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_retries_server_errors_with_backoff() {
        let stub = GeminiStub::new(2, StatusCode::SERVICE_UNAVAILABLE);
        let client = client_for(serve(stub.clone()).await);

        let started = tokio::time::Instant::now();
        let text = client.generate("prompt").await.unwrap();

        assert_eq!(text, "## Strengths\n- Consistent");
        assert_eq!(stub.attempts(), 3);
        // 1s after the first failure, 2s after the second.
        assert!(started.elapsed() >= std::time::Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_gives_up_after_rate_limits() {
        let stub = GeminiStub::new(usize::MAX, StatusCode::TOO_MANY_REQUESTS);
        let client = client_for(serve(stub.clone()).await);

        let err = client.call("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 429, .. }), "{err}");
        assert_eq!(stub.attempts(), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_call_does_not_retry_client_errors() {
        let stub = GeminiStub::new(usize::MAX, StatusCode::BAD_REQUEST);
        let client = client_for(serve(stub.clone()).await);

        match client.call("prompt").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "try again later");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert_eq!(stub.attempts(), 1);
    }

    #[tokio::test]
    async fn test_call_sends_api_key() {
        let stub = GeminiStub::new(0, StatusCode::OK);
        let base_url = serve(stub.clone()).await;
        let client = LlmClient::new("wrong-key".to_string()).with_base_url(base_url);

        let err = client.call("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }), "{err}");
        assert_eq!(stub.attempts(), 0);
    }

    #[tokio::test]
    async fn test_list_models_follows_pages() {
        let client = client_for(serve(GeminiStub::new(0, StatusCode::OK)).await);

        let models = client.list_models().await.unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["models/gemini-1.5-pro", "models/embedding-001"]);
        assert_eq!(models[0].supported_generation_methods, ["generateContent"]);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r###"{
            "candidates": [{
                "content": {"parts": [{"text": "## Strengths\n"}, {"text": "- Consistent"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 8, "totalTokenCount": 20}
        }"###;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("## Strengths\n- Consistent"));
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 12);
    }

    #[test]
    fn test_response_text_empty_when_blocked() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());

        let response: LlmResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_error_message_extracts_api_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body.to_string()), "API key not valid");
        assert_eq!(error_message("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_request_serializes_gemini_shape() {
        let body = GenerateRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn test_model_list_deserializes() {
        let json = r#"{"models": [{
            "name": "models/gemini-1.5-pro",
            "displayName": "Gemini 1.5 Pro",
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        }]}"#;
        let list: ModelList = serde_json::from_str(json).unwrap();
        assert_eq!(list.models[0].name, "models/gemini-1.5-pro");
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = LlmClient::new("key".into()).with_base_url("http://localhost:9999/");
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}
