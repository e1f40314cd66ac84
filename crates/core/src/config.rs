//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Output language for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean
    #[default]
    Ko,
    /// English
    En,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" | "korean" => Ok(Language::Ko),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key (falls back to `GEMINI_API_KEY` / `API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// Configured key, or the one from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

/// Exponential backoff for transient generation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Delay multiplier between retries
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_multiplier() -> u32 {
    2
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = u64::from(self.multiplier).saturating_pow(retry);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Output language
    #[serde(default)]
    pub language: Language,

    /// Generation service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Transient retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Spreadsheet script endpoint for cloud backup
    #[serde(default)]
    pub cloud_backup_url: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".pulse")
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            language: Language::default(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            cloud_backup_url: None,
        }
    }
}

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PulseConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: PulseConfig = serde_json::from_str(r#"{"language":"en"}"#).unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.data_dir, PathBuf::from(".pulse"));
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let config = PulseConfig::load("/nonexistent/pulse.json").unwrap();
        assert_eq!(config.language, Language::Ko);
    }
}
