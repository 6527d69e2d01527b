//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends requests to the Generative Language API
//! (`/v1beta/models/{model}:generateContent`) with the API key in the
//! `x-goog-api-key` header. Non-streaming only.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmProvider;
use parley_types::llm::{ChatTurn, ExchangeReply, ExchangeRequest, LlmError};

use super::types::{
    GeminiContent, GeminiErrorResponse, GeminiPart, GenerateContentRequest,
    GenerateContentResponse,
};

/// Google Gemini LLM provider.
///
/// Implements [`LlmProvider`] for the Generative Language API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers. The provider deliberately does not
/// derive `Debug`, so it can never end up in logs wholesale.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    /// Create a new Gemini provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Gemini API key wrapped in SecretString
    /// * `model` - Model identifier (e.g., "gemini-1.5-flash")
    pub fn new(api_key: SecretString, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
        }
    }

    /// The model this provider sends requests for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// The full endpoint URL for this provider's model.
    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Convert a generic [`ExchangeRequest`] into the Gemini wire shape.
    fn to_gemini_request(request: &ExchangeRequest) -> GenerateContentRequest {
        let contents = request
            .turns
            .iter()
            .map(|turn: &ChatTurn| GeminiContent {
                role: turn.role.to_string(),
                parts: vec![GeminiPart {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest { contents }
    }

    /// Pull the reply text out of a successful response.
    ///
    /// `None` when the response carries no candidates or no text parts
    /// (e.g., a fully blocked reply).
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        Some(
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(""),
        )
    }

    /// Map a non-success HTTP status and body to a typed [`LlmError`].
    fn error_for_status(status: u16, body: &str, retry_after_ms: Option<u64>) -> LlmError {
        // The API wraps failures in an error envelope; fall back to the
        // raw body when it is not JSON.
        let message = serde_json::from_str::<GeminiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            401 | 403 => LlmError::AuthenticationFailed,
            429 => LlmError::RateLimited { retry_after_ms },
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {message}"),
            },
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeReply, LlmError> {
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(
                status.as_u16(),
                &error_body,
                retry_after_ms,
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(format!("failed to parse response: {e}")))?;

        let content = Self::extract_text(&parsed).ok_or_else(|| {
            LlmError::MalformedResponse("response contained no text candidates".to_string())
        })?;

        Ok(ExchangeReply { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::ProviderRole;

    fn make_provider() -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from("test-key-not-real"),
            "gemini-1.5-flash".to_string(),
        )
    }

    #[test]
    fn test_provider_name_and_model() {
        let provider = make_provider();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_url_building() {
        let provider = make_provider();
        assert_eq!(
            provider.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_base_url_override() {
        let provider = make_provider().with_base_url("http://localhost:8080".to_string());
        assert_eq!(
            provider.url(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_to_gemini_request_maps_roles() {
        let request = ExchangeRequest {
            turns: vec![
                ChatTurn {
                    role: ProviderRole::User,
                    content: "Hello".to_string(),
                },
                ChatTurn {
                    role: ProviderRole::Model,
                    content: "Hi!".to_string(),
                },
                ChatTurn {
                    role: ProviderRole::User,
                    content: "How are you?".to_string(),
                },
            ],
        };

        let gemini_req = GeminiProvider::to_gemini_request(&request);
        assert_eq!(gemini_req.contents.len(), 3);
        assert_eq!(gemini_req.contents[0].role, "user");
        assert_eq!(gemini_req.contents[1].role, "model");
        assert_eq!(gemini_req.contents[1].parts[0].text, "Hi!");
        assert_eq!(gemini_req.contents[2].role, "user");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}], "role": "model"}
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            GeminiProvider::extract_text(&resp).as_deref(),
            Some("Hello world")
        );
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(GeminiProvider::extract_text(&resp).is_none());
    }

    #[test]
    fn test_error_for_status_authentication() {
        let err = GeminiProvider::error_for_status(403, "forbidden", None);
        assert!(matches!(err, LlmError::AuthenticationFailed));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_for_status_rate_limited() {
        let body = r#"{"error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = GeminiProvider::error_for_status(429, body, Some(2000));
        match err {
            LlmError::RateLimited { retry_after_ms } => {
                assert_eq!(retry_after_ms, Some(2000));
            }
            other => panic!("expected RateLimited, got: {other}"),
        }
    }

    #[test]
    fn test_error_for_status_uses_envelope_message() {
        let body = r#"{"error": {"code": 500, "message": "internal failure", "status": "INTERNAL"}}"#;
        let err = GeminiProvider::error_for_status(500, body, None);
        match err {
            LlmError::Provider { message } => {
                assert!(message.contains("internal failure"));
                assert!(message.contains("500"));
            }
            other => panic!("expected Provider, got: {other}"),
        }
    }

    #[test]
    fn test_error_for_status_raw_body_fallback() {
        let err = GeminiProvider::error_for_status(503, "service unavailable", None);
        match err {
            LlmError::Provider { message } => assert!(message.contains("service unavailable")),
            other => panic!("expected Provider, got: {other}"),
        }
    }
}
