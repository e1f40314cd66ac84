//! Pulse core data models.
//!
//! This crate defines the surveys, responses, universities and analysis
//! records shared by the storage, generation and analysis crates.

#![warn(missing_docs)]

// Core identities
mod id;

// Survey content
mod survey;
mod response;
mod university;
mod prize;

// Analysis records
mod analysis;

// Configuration
pub mod config;

// Re-exports
pub use id::*;

pub use survey::{Survey, SurveyStatus, SurveySource, Question, QuestionType};
pub use response::{SurveyResponse, Answer};
pub use university::University;
pub use prize::PrizeDrawRecord;
pub use analysis::{
    AnalysisMethod, AnalysisStatus, AnalysisState, AnalysisResult, AnalysisPayload,
    ComprehensiveReport, IpaPoint, BoxPlotRow, CorrespondencePoint, VisionAlignment,
    UnknownMethod,
};
pub use config::{Language, GenerationConfig, RetryPolicy, PulseConfig, ConfigError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
