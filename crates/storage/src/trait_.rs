//! Storage trait abstraction.

use async_trait::async_trait;
use pulse_core::{
    PrizeDrawId, PrizeDrawRecord, Survey, SurveyId, SurveyResponse, University, UniversityId,
};

use crate::backup::BackupSnapshot;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote backup endpoint error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for Pulse data.
///
/// Surveys are always written as whole objects: `save_survey` replaces the
/// stored survey, analysis history included. Responses are append-only.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Survey operations ===

    /// Save a survey (create or replace).
    async fn save_survey(&mut self, survey: &Survey) -> Result<()>;

    /// Load a survey by ID.
    async fn load_survey(&self, id: SurveyId) -> Result<Option<Survey>>;

    /// List all surveys.
    async fn list_surveys(&self) -> Result<Vec<Survey>>;

    /// Delete a survey and its responses.
    async fn delete_survey(&mut self, id: SurveyId) -> Result<()>;

    // === Response operations ===

    /// Append a response.
    async fn save_response(&mut self, response: &SurveyResponse) -> Result<()>;

    /// List responses submitted to a survey, in submission order.
    async fn list_responses(&self, survey_id: SurveyId) -> Result<Vec<SurveyResponse>>;

    /// List every stored response.
    async fn list_all_responses(&self) -> Result<Vec<SurveyResponse>>;

    // === University operations ===

    /// Save a university (create or replace).
    async fn save_university(&mut self, university: &University) -> Result<()>;

    /// Load a university by ID.
    async fn load_university(&self, id: UniversityId) -> Result<Option<University>>;

    /// List all universities.
    async fn list_universities(&self) -> Result<Vec<University>>;

    /// Delete a university.
    async fn delete_university(&mut self, id: UniversityId) -> Result<()>;

    // === Prize draw operations ===

    /// Save a prize draw record.
    async fn save_prize_draw(&mut self, record: &PrizeDrawRecord) -> Result<()>;

    /// List prize draws, most recent first.
    async fn list_prize_draws(&self) -> Result<Vec<PrizeDrawRecord>>;

    /// Delete a prize draw record.
    async fn delete_prize_draw(&mut self, id: PrizeDrawId) -> Result<()>;

    // === Backup ===

    /// Replace every collection present in the snapshot.
    async fn restore(&mut self, snapshot: BackupSnapshot) -> Result<()>;

    /// Capture all collections.
    async fn snapshot(&self) -> Result<BackupSnapshot> {
        Ok(BackupSnapshot::new(
            self.list_surveys().await?,
            self.list_all_responses().await?,
            self.list_universities().await?,
            self.list_prize_draws().await?,
        ))
    }
}
