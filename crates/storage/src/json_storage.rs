//! JSON file storage implementation.
//!
//! Stores each entity as a JSON file in a data directory and keeps small
//! per-survey meta markers (version + updated_at) so repeated whole-object
//! survey writes can be traced.

use std::path::{Path, PathBuf};
use pulse_core::{
    PrizeDrawId, PrizeDrawRecord, Survey, SurveyId, SurveyResponse, University, UniversityId,
};
use super::{BackupSnapshot, Result, Storage};
use tokio::fs;
use tracing::debug;

const SURVEYS: &str = "surveys";
const RESPONSES: &str = "responses";
const UNIVERSITIES: &str = "universities";
const PRIZE_DRAWS: &str = "prize_draws";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the data subdirectories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in [SURVEYS, RESPONSES, UNIVERSITIES, PRIZE_DRAWS] {
            fs::create_dir_all(root.join(kind)).await?;
        }
        fs::create_dir_all(root.join("meta").join(SURVEYS)).await?;

        Ok(Self { root })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entity_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        write_atomic(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn clear_dir(&self, kind: &str) -> Result<()> {
        let dir = self.root.join(kind);
        let mut rd = fs::read_dir(&dir).await?;
        while let Some(entry) = rd.next_entry().await? {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    async fn write_entity<T: serde::Serialize>(
        &self,
        kind: &str,
        id: impl std::fmt::Display,
        value: &T,
    ) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        write_atomic(&self.entity_path(kind, id), json.as_bytes()).await
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_survey(&mut self, survey: &Survey) -> Result<()> {
        self.write_entity(SURVEYS, survey.id, survey).await?;
        let version = self.bump_version(SURVEYS, &survey.id.to_string()).await?;
        debug!("Saved survey {} (version {})", survey.id, version);
        Ok(())
    }

    async fn load_survey(&self, id: SurveyId) -> Result<Option<Survey>> {
        read_json(&self.entity_path(SURVEYS, id)).await
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        let mut surveys: Vec<Survey> = list_dir(&self.root.join(SURVEYS)).await?;
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(surveys)
    }

    async fn delete_survey(&mut self, id: SurveyId) -> Result<()> {
        remove_if_exists(&self.entity_path(SURVEYS, id)).await?;
        remove_if_exists(&self.meta_path(SURVEYS, &id.to_string())).await?;
        for response in self.list_responses(id).await? {
            remove_if_exists(&self.entity_path(RESPONSES, response.id)).await?;
        }
        Ok(())
    }

    async fn save_response(&mut self, response: &SurveyResponse) -> Result<()> {
        self.write_entity(RESPONSES, response.id, response).await
    }

    async fn list_responses(&self, survey_id: SurveyId) -> Result<Vec<SurveyResponse>> {
        let all = self.list_all_responses().await?;
        Ok(all.into_iter().filter(|r| r.survey_id == survey_id).collect())
    }

    async fn list_all_responses(&self) -> Result<Vec<SurveyResponse>> {
        let mut responses: Vec<SurveyResponse> = list_dir(&self.root.join(RESPONSES)).await?;
        responses.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(responses)
    }

    async fn save_university(&mut self, university: &University) -> Result<()> {
        self.write_entity(UNIVERSITIES, university.id, university).await
    }

    async fn load_university(&self, id: UniversityId) -> Result<Option<University>> {
        read_json(&self.entity_path(UNIVERSITIES, id)).await
    }

    async fn list_universities(&self) -> Result<Vec<University>> {
        let mut universities: Vec<University> = list_dir(&self.root.join(UNIVERSITIES)).await?;
        universities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(universities)
    }

    async fn delete_university(&mut self, id: UniversityId) -> Result<()> {
        remove_if_exists(&self.entity_path(UNIVERSITIES, id)).await
    }

    async fn save_prize_draw(&mut self, record: &PrizeDrawRecord) -> Result<()> {
        self.write_entity(PRIZE_DRAWS, record.id, record).await
    }

    async fn list_prize_draws(&self) -> Result<Vec<PrizeDrawRecord>> {
        let mut draws: Vec<PrizeDrawRecord> = list_dir(&self.root.join(PRIZE_DRAWS)).await?;
        draws.sort_by(|a, b| b.drawn_at.cmp(&a.drawn_at));
        Ok(draws)
    }

    async fn delete_prize_draw(&mut self, id: PrizeDrawId) -> Result<()> {
        remove_if_exists(&self.entity_path(PRIZE_DRAWS, id)).await
    }

    async fn restore(&mut self, snapshot: BackupSnapshot) -> Result<()> {
        if let Some(surveys) = snapshot.surveys {
            self.clear_dir(SURVEYS).await?;
            for survey in &surveys {
                self.save_survey(survey).await?;
            }
        }
        if let Some(responses) = snapshot.responses {
            self.clear_dir(RESPONSES).await?;
            for response in &responses {
                self.save_response(response).await?;
            }
        }
        if let Some(universities) = snapshot.universities {
            self.clear_dir(UNIVERSITIES).await?;
            for university in &universities {
                self.save_university(university).await?;
            }
        }
        if let Some(draws) = snapshot.prize_history {
            self.clear_dir(PRIZE_DRAWS).await?;
            for draw in &draws {
                self.save_prize_draw(draw).await?;
            }
        }
        Ok(())
    }
}

/// Write through a temp file so readers never observe a torn survey.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{AnalysisMethod, AnalysisResult, Question};

    #[tokio::test]
    async fn test_survey_round_trip_with_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let mut survey = Survey::new("Dining", "Cafeteria feedback")
            .with_question(Question::likert("Taste"));
        survey
            .analysis_history
            .push(AnalysisResult::failed(AnalysisMethod::Comprehensive, "quota"));
        storage.save_survey(&survey).await.unwrap();

        let loaded = storage.load_survey(survey.id).await.unwrap().unwrap();
        assert_eq!(loaded, survey);
    }

    #[tokio::test]
    async fn test_missing_survey_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        assert!(storage.load_survey(SurveyId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_survey_version_increments_per_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let survey = Survey::new("Housing", "");
        storage.save_survey(&survey).await.unwrap();
        storage.save_survey(&survey).await.unwrap();

        let version = storage.bump_version(SURVEYS, &survey.id.to_string()).await.unwrap();
        assert_eq!(version, 3);
    }

    #[tokio::test]
    async fn test_delete_survey_removes_responses() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let survey = Survey::new("Sports", "");
        storage.save_survey(&survey).await.unwrap();
        storage.save_response(&SurveyResponse::new(survey.id)).await.unwrap();

        storage.delete_survey(survey.id).await.unwrap();
        assert!(storage.list_surveys().await.unwrap().is_empty());
        assert!(storage.list_all_responses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_replaces_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        storage.save_survey(&Survey::new("Old", "")).await.unwrap();

        let replacement = Survey::new("New", "");
        let snapshot = BackupSnapshot::new(vec![replacement.clone()], vec![], vec![], vec![]);
        storage.restore(snapshot).await.unwrap();

        let surveys = storage.list_surveys().await.unwrap();
        assert_eq!(surveys.len(), 1);
        assert_eq!(surveys[0].id, replacement.id);
    }
}
