//! Generation capability and analysis dispatch.
//!
//! Wraps the remote generation service behind [`GenerationService`] and
//! builds the per-method prompts that turn survey responses into analysis
//! records.

#![warn(missing_docs)]

pub mod generation;
pub mod gemini;
pub mod retry;
pub mod prompt;
pub mod dispatcher;
pub mod authoring;

pub use generation::{
    GenerationService, GenerationRequest, GenerationError, Result, parse_structured,
    strip_code_fences,
};
pub use gemini::GeminiClient;
pub use retry::call_with_retry;
pub use prompt::PromptBuilder;
pub use dispatcher::{
    AnalysisDispatcher, AnalysisRequest, failure_summary, RATE_LIMIT_SUMMARY,
    VISION_MISSING_SUMMARY,
};
pub use authoring::AuthoringAssistant;
