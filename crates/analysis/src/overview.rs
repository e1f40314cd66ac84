//! Dashboard overview across surveys.

use pulse_core::{
    AnalysisMethod, AnalysisPayload, AnalysisResult, Survey, SurveyId, SurveyResponse,
    SurveySource, Time, University, UniversityId,
};
use serde::Serialize;

use crate::stats::fallback_score;

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOverview {
    /// Survey
    pub survey_id: SurveyId,
    /// Survey title
    pub title: String,
    /// Responses belonging to this survey
    pub response_count: usize,
    /// 0-100
    pub score: u32,
    /// Methods with any record, first seen first
    pub methods_performed: Vec<AnalysisMethod>,
    /// Most recent history entry
    pub latest_analysis: Option<AnalysisResult>,
    /// Linked university, if it still exists
    pub university_name: Option<String>,
    /// Where the survey came from
    pub source: SurveySource,
    /// Creation time
    pub created_at: Time,
}

impl SurveyOverview {
    /// Summarize one survey. `responses` may contain other surveys' responses.
    pub fn build(survey: &Survey, responses: &[SurveyResponse], universities: &[University]) -> Self {
        let own: Vec<SurveyResponse> = responses
            .iter()
            .filter(|r| r.survey_id == survey.id)
            .cloned()
            .collect();
        let latest = survey.analysis_history.first();

        let score = latest
            .and_then(comprehensive_score)
            .or_else(|| fallback_score(survey, &own))
            .unwrap_or(0.0);

        let mut methods_performed = Vec::new();
        for record in &survey.analysis_history {
            if !methods_performed.contains(&record.method) {
                methods_performed.push(record.method);
            }
        }

        Self {
            survey_id: survey.id,
            title: survey.title.clone(),
            response_count: own.len(),
            score: score.round() as u32,
            methods_performed,
            latest_analysis: latest.cloned(),
            university_name: survey
                .university_id
                .and_then(|id| universities.iter().find(|u| u.id == id))
                .map(|u| u.name.clone()),
            source: survey.source,
            created_at: survey.created_at,
        }
    }
}

/// Non-zero sentiment index of a completed comprehensive record.
fn comprehensive_score(record: &AnalysisResult) -> Option<f64> {
    match record.payload() {
        Some(AnalysisPayload::Comprehensive(report)) if report.sentiment_score > 0 => {
            Some(f64::from(report.sentiment_score))
        }
        _ => None,
    }
}

/// Dashboard rows, newest survey first, optionally for one university.
pub fn overviews(
    surveys: &[Survey],
    responses: &[SurveyResponse],
    universities: &[University],
    university: Option<UniversityId>,
) -> Vec<SurveyOverview> {
    let mut rows: Vec<SurveyOverview> = surveys
        .iter()
        .filter(|s| university.map_or(true, |id| s.university_id == Some(id)))
        .map(|s| SurveyOverview::build(s, responses, universities))
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pulse_core::{ComprehensiveReport, Question};

    fn survey_with_answers(answers: &[i32]) -> (Survey, Vec<SurveyResponse>) {
        let q = Question::likert("Overall");
        let survey = Survey::new("Campus", "").with_question(q.clone());
        let responses = answers
            .iter()
            .map(|a| SurveyResponse::new(survey.id).with_answer(q.id, *a))
            .collect();
        (survey, responses)
    }

    fn basic(score: u8) -> AnalysisResult {
        AnalysisResult::completed(
            "ok",
            AnalysisPayload::Comprehensive(ComprehensiveReport { sentiment_score: score, ..Default::default() }),
        )
    }

    #[test]
    fn test_score_prefers_latest_sentiment() {
        let (mut survey, responses) = survey_with_answers(&[1, 1]);
        survey.analysis_history = vec![basic(73)];

        let row = SurveyOverview::build(&survey, &responses, &[]);
        assert_eq!(row.score, 73);
        assert_eq!(row.methods_performed, vec![AnalysisMethod::Comprehensive]);
        assert_eq!(row.response_count, 2);
    }

    #[test]
    fn test_score_falls_back_to_likert_average() {
        let (mut survey, responses) = survey_with_answers(&[4, 5, 3, 4, 5]);
        // latest is not comprehensive, so the older sentiment is ignored
        survey.analysis_history = vec![
            AnalysisResult::pending(AnalysisMethod::Demographic),
            basic(10),
        ];

        let row = SurveyOverview::build(&survey, &responses, &[]);
        assert_eq!(row.score, 84);
    }

    #[test]
    fn test_zero_sentiment_uses_fallback() {
        let (mut survey, responses) = survey_with_answers(&[2]);
        survey.analysis_history = vec![basic(0)];
        assert_eq!(SurveyOverview::build(&survey, &responses, &[]).score, 40);
    }

    #[test]
    fn test_no_data_scores_zero() {
        let (survey, _) = survey_with_answers(&[]);
        let row = SurveyOverview::build(&survey, &[], &[]);
        assert_eq!(row.score, 0);
        assert!(row.latest_analysis.is_none());
    }

    #[test]
    fn test_overviews_sorted_and_filtered() {
        let hanbit = University::new("Hanbit", "Seoul", 100);
        let mut old = Survey::new("Old", "").with_university(hanbit.id);
        old.created_at = old.created_at - Duration::days(3);
        let new = Survey::new("New", "").with_university(hanbit.id);
        let other = Survey::new("Other", "");

        let surveys = vec![old, new, other];
        let rows = overviews(&surveys, &[], std::slice::from_ref(&hanbit), None);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].title, "Old");

        let rows = overviews(&surveys, &[], std::slice::from_ref(&hanbit), Some(hanbit.id));
        let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
        assert_eq!(rows[0].university_name.as_deref(), Some("Hanbit"));
    }
}
