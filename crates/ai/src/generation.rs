//! The structured generation capability.
//!
//! A generation service takes an instruction and an optional output schema
//! and returns raw model text. Callers parse the text with
//! [`parse_structured`].

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Result type for generation calls.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised by a generation service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The service answered with an error status.
    #[error("API error{}: {message}", format_code(.code))]
    Api {
        /// Numeric error code (HTTP status or service code)
        code: Option<u16>,
        /// Error message
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be parsed into the expected structure.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No API key is configured.
    #[error("API key not configured")]
    MissingApiKey,
}

fn format_code(code: &Option<u16>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl GenerationError {
    /// Error code, if the service returned one.
    pub fn code(&self) -> Option<u16> {
        match self {
            GenerationError::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// Quota exhaustion or rate limiting.
    pub fn is_rate_limit(&self) -> bool {
        self.code() == Some(429) || self.to_string().contains("429")
    }

    /// Failure classes worth retrying: rate limits, quota, overload.
    pub fn is_transient(&self) -> bool {
        if matches!(self, GenerationError::MalformedResponse(_) | GenerationError::MissingApiKey) {
            return false;
        }
        self.is_rate_limit() || self.code() == Some(503) || self.to_string().contains("quota")
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GenerationError::Api {
                code: Some(status.as_u16()),
                message: err.to_string(),
            },
            None => GenerationError::Transport(err.to_string()),
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full instruction text
    pub prompt: String,

    /// Output schema; `None` requests free text
    pub schema: Option<Value>,
}

impl GenerationRequest {
    /// Request structured JSON output.
    pub fn structured(prompt: impl Into<String>, schema: Value) -> Self {
        Self { prompt: prompt.into(), schema: Some(schema) }
    }

    /// Request free text.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), schema: None }
    }
}

/// Generation capability.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run one generation call and return the raw response text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:json)?").ok()).as_ref()
}

/// Strip markdown code fences from model output.
pub fn strip_code_fences(text: &str) -> String {
    match fence_regex() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Parse model output as JSON, tolerating markdown fences.
pub fn parse_structured(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(GenerationError::MalformedResponse("empty response".to_string()));
    }
    serde_json::from_str(&cleaned).map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}
