//! Gemini generation client.
//!
//! Calls the `generateContent` endpoint, asking for JSON output constrained by
//! a response schema when the request carries one.

use async_trait::async_trait;
use pulse_core::GenerationConfig;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use tracing::debug;

use crate::generation::{GenerationError, GenerationRequest, GenerationService, Result};

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client
    client: Client,

    /// API base URL
    base_url: String,

    /// Model name
    model: String,

    /// API key
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client from configuration.
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
        }
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(request: &GenerationRequest) -> Value {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
        });
        if let Some(schema) = &request.schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }
        body
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        debug!("Calling {} ({} prompt chars)", self.model, request.prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &error_text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        Ok(extract_text(&body))
    }
}

/// Map an error response to a generation error, preferring the service's own code.
fn api_error(status: u16, body: &str) -> GenerationError {
    #[derive(serde::Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(serde::Deserialize)]
    struct ErrorBody {
        code: Option<u16>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => GenerationError::Api {
            code: envelope.error.code.or(Some(status)),
            message: envelope.error.message.unwrap_or_else(|| body.to_string()),
        },
        Err(_) => GenerationError::Api {
            code: Some(status),
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &Value) -> String {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_request_body() {
        let request = GenerationRequest::structured("Analyze", json!({"type": "OBJECT"}));
        let body = GeminiClient::request_body(&request);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_text_request_has_no_schema() {
        let body = GeminiClient::request_body(&GenerationRequest::text("Hello"));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_api_error_uses_service_code() {
        let err = api_error(
            429,
            r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(err.code(), Some(429));
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_api_error_with_plain_body() {
        let err = api_error(503, "Service Unavailable");
        assert_eq!(err.code(), Some(503));
        assert!(err.is_transient());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        });
        assert_eq!(extract_text(&body), "{\"a\":1}");
        assert_eq!(extract_text(&json!({})), "");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let config = GenerationConfig {
            api_key: Some(String::new()),
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        let mut client = GeminiClient::new(&config);
        client.api_key = None;
        let err = client.generate(&GenerationRequest::text("hi")).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
