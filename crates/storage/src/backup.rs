//! Backup snapshots of all collections.

use pulse_core::{PrizeDrawRecord, Survey, SurveyResponse, Time, University};
use serde::{Deserialize, Serialize};

/// Backup format version written by this crate.
pub const BACKUP_VERSION: &str = "1.0";

/// Whole-application snapshot exchanged with backup files and the cloud endpoint.
///
/// Absent collections are left untouched on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    /// Surveys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surveys: Option<Vec<Survey>>,

    /// Responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<SurveyResponse>>,

    /// Universities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universities: Option<Vec<University>>,

    /// Prize history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_history: Option<Vec<PrizeDrawRecord>>,

    /// When the snapshot was taken
    #[serde(default)]
    pub backup_date: Option<Time>,

    /// Format version
    #[serde(default)]
    pub version: Option<String>,
}

impl BackupSnapshot {
    /// Snapshot with every collection present.
    pub fn new(
        surveys: Vec<Survey>,
        responses: Vec<SurveyResponse>,
        universities: Vec<University>,
        prize_history: Vec<PrizeDrawRecord>,
    ) -> Self {
        Self {
            surveys: Some(surveys),
            responses: Some(responses),
            universities: Some(universities),
            prize_history: Some(prize_history),
            backup_date: Some(chrono::Utc::now()),
            version: Some(BACKUP_VERSION.to_string()),
        }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Pretty JSON for backup files.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the snapshot carries no collection at all.
    pub fn is_empty(&self) -> bool {
        self.surveys.is_none()
            && self.responses.is_none()
            && self.universities.is_none()
            && self.prize_history.is_none()
    }
}

/// Write a snapshot to a file.
pub async fn export_to_file(snapshot: &BackupSnapshot, path: &std::path::Path) -> crate::Result<()> {
    tokio::fs::write(path, snapshot.to_json_pretty()?.as_bytes()).await?;
    Ok(())
}

/// Read a snapshot from a file.
pub async fn import_from_file(path: &std::path::Path) -> crate::Result<BackupSnapshot> {
    let text = tokio::fs::read_to_string(path).await?;
    BackupSnapshot::from_json(&text)
}
