//! In-memory storage backend.

use async_trait::async_trait;
use pulse_core::{
    PrizeDrawId, PrizeDrawRecord, Survey, SurveyId, SurveyResponse, University, UniversityId,
};

use super::{BackupSnapshot, Result, Storage};

/// Process-local storage, mirroring the browser-side state container.
///
/// Surveys keep newest-created-first order; responses keep submission order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    surveys: Vec<Survey>,
    responses: Vec<SurveyResponse>,
    universities: Vec<University>,
    prize_history: Vec<PrizeDrawRecord>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_survey(&mut self, survey: &Survey) -> Result<()> {
        match self.surveys.iter_mut().find(|s| s.id == survey.id) {
            Some(existing) => *existing = survey.clone(),
            None => self.surveys.insert(0, survey.clone()),
        }
        Ok(())
    }

    async fn load_survey(&self, id: SurveyId) -> Result<Option<Survey>> {
        Ok(self.surveys.iter().find(|s| s.id == id).cloned())
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        Ok(self.surveys.clone())
    }

    async fn delete_survey(&mut self, id: SurveyId) -> Result<()> {
        self.surveys.retain(|s| s.id != id);
        self.responses.retain(|r| r.survey_id != id);
        Ok(())
    }

    async fn save_response(&mut self, response: &SurveyResponse) -> Result<()> {
        self.responses.push(response.clone());
        Ok(())
    }

    async fn list_responses(&self, survey_id: SurveyId) -> Result<Vec<SurveyResponse>> {
        Ok(self
            .responses
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn list_all_responses(&self) -> Result<Vec<SurveyResponse>> {
        Ok(self.responses.clone())
    }

    async fn save_university(&mut self, university: &University) -> Result<()> {
        match self.universities.iter_mut().find(|u| u.id == university.id) {
            Some(existing) => *existing = university.clone(),
            None => self.universities.push(university.clone()),
        }
        Ok(())
    }

    async fn load_university(&self, id: UniversityId) -> Result<Option<University>> {
        Ok(self.universities.iter().find(|u| u.id == id).cloned())
    }

    async fn list_universities(&self) -> Result<Vec<University>> {
        Ok(self.universities.clone())
    }

    async fn delete_university(&mut self, id: UniversityId) -> Result<()> {
        self.universities.retain(|u| u.id != id);
        Ok(())
    }

    async fn save_prize_draw(&mut self, record: &PrizeDrawRecord) -> Result<()> {
        self.prize_history.insert(0, record.clone());
        Ok(())
    }

    async fn list_prize_draws(&self) -> Result<Vec<PrizeDrawRecord>> {
        Ok(self.prize_history.clone())
    }

    async fn delete_prize_draw(&mut self, id: PrizeDrawId) -> Result<()> {
        self.prize_history.retain(|p| p.id != id);
        Ok(())
    }

    async fn restore(&mut self, snapshot: BackupSnapshot) -> Result<()> {
        if let Some(surveys) = snapshot.surveys {
            self.surveys = surveys;
        }
        if let Some(responses) = snapshot.responses {
            self.responses = responses;
        }
        if let Some(universities) = snapshot.universities {
            self.universities = universities;
        }
        if let Some(prize_history) = snapshot.prize_history {
            self.prize_history = prize_history;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Question, SurveyResponse};

    #[tokio::test]
    async fn test_save_survey_replaces_whole_object() {
        let mut storage = MemoryStorage::new();
        let mut survey = Survey::new("Dorms", "");
        storage.save_survey(&survey).await.unwrap();

        survey.questions.push(Question::likert("Cleanliness"));
        storage.save_survey(&survey).await.unwrap();

        let all = storage.list_surveys().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].questions.len(), 1);
    }

    #[tokio::test]
    async fn test_new_surveys_listed_first() {
        let mut storage = MemoryStorage::new();
        let first = Survey::new("First", "");
        let second = Survey::new("Second", "");
        storage.save_survey(&first).await.unwrap();
        storage.save_survey(&second).await.unwrap();

        let titles: Vec<_> = storage
            .list_surveys()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_responses_filtered_by_survey() {
        let mut storage = MemoryStorage::new();
        let a = Survey::new("A", "");
        let b = Survey::new("B", "");
        storage.save_response(&SurveyResponse::new(a.id)).await.unwrap();
        storage.save_response(&SurveyResponse::new(b.id)).await.unwrap();
        storage.save_response(&SurveyResponse::new(a.id)).await.unwrap();

        assert_eq!(storage.list_responses(a.id).await.unwrap().len(), 2);
        assert_eq!(storage.list_responses(b.id).await.unwrap().len(), 1);

        storage.delete_survey(a.id).await.unwrap();
        assert!(storage.list_responses(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_only_touches_present_collections() {
        let mut storage = MemoryStorage::new();
        storage.save_survey(&Survey::new("Kept", "")).await.unwrap();
        storage
            .save_university(&University::new("Hanbit", "Seoul", 100))
            .await
            .unwrap();

        let snapshot = BackupSnapshot {
            universities: Some(vec![]),
            ..BackupSnapshot::from_json("{}").unwrap()
        };
        storage.restore(snapshot).await.unwrap();

        assert_eq!(storage.list_surveys().await.unwrap().len(), 1);
        assert!(storage.list_universities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let mut source = MemoryStorage::new();
        let survey = Survey::new("Library", "");
        source.save_survey(&survey).await.unwrap();
        source.save_response(&SurveyResponse::new(survey.id)).await.unwrap();

        let snapshot = source.snapshot().await.unwrap();
        let mut target = MemoryStorage::new();
        target.restore(snapshot).await.unwrap();

        assert_eq!(target.list_surveys().await.unwrap(), source.list_surveys().await.unwrap());
        assert_eq!(target.list_responses(survey.id).await.unwrap().len(), 1);
    }
}
