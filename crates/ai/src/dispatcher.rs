//! Analysis request dispatcher.
//!
//! Turns one `(survey, responses, language, method, university)` request into
//! exactly one generation call and one normalized [`AnalysisResult`]. The
//! dispatcher never returns an error: every failure becomes a FAILED record.

use std::sync::Arc;
use pulse_core::{
    AnalysisMethod, AnalysisPayload, AnalysisResult, BoxPlotRow, ComprehensiveReport,
    CorrespondencePoint, IpaPoint, Language, RetryPolicy, Survey, SurveyResponse, University,
    VisionAlignment,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::generation::{parse_structured, GenerationError, GenerationService, Result};
use crate::prompt::PromptBuilder;
use crate::retry::call_with_retry;

/// Summary for failures caused by quota exhaustion or rate limiting.
pub const RATE_LIMIT_SUMMARY: &str =
    "Analysis failed due to API quota limits (429). Please try again later or check your billing plan.";

/// Summary for vision alignment requested without a vision statement.
pub const VISION_MISSING_SUMMARY: &str = "University vision statement is missing. Register a vision for the linked university before running vision alignment analysis.";

/// Everything one analysis call needs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Survey (question text and types)
    pub survey: Survey,

    /// Responses belonging to the survey
    pub responses: Vec<SurveyResponse>,

    /// Output language
    pub language: Language,

    /// Method to run
    pub method: AnalysisMethod,

    /// Linked university, required for vision alignment
    pub university: Option<University>,
}

impl AnalysisRequest {
    /// Create a request without university context.
    pub fn new(survey: Survey, responses: Vec<SurveyResponse>, method: AnalysisMethod) -> Self {
        Self {
            survey,
            responses,
            language: Language::default(),
            method,
            university: None,
        }
    }

    /// Set the output language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Attach the linked university.
    pub fn with_university(mut self, university: Option<University>) -> Self {
        self.university = university;
        self
    }

    fn vision(&self) -> Option<&str> {
        self.university.as_ref().and_then(University::vision_statement)
    }
}

/// Dispatches analysis requests to a generation service.
#[derive(Clone)]
pub struct AnalysisDispatcher {
    generator: Arc<dyn GenerationService>,
    retry: RetryPolicy,
}

impl AnalysisDispatcher {
    /// Create a dispatcher.
    pub fn new(generator: Arc<dyn GenerationService>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// Check method preconditions without calling the service.
    ///
    /// Returns the FAILED record to surface when a precondition is unmet.
    pub fn check_preconditions(request: &AnalysisRequest) -> Option<AnalysisResult> {
        if request.method == AnalysisMethod::VisionAlignment && request.vision().is_none() {
            return Some(AnalysisResult::failed(request.method, VISION_MISSING_SUMMARY));
        }
        None
    }

    /// Run one analysis. Always resolves to a COMPLETED or FAILED record.
    pub async fn dispatch(&self, request: &AnalysisRequest) -> AnalysisResult {
        if let Some(failed) = Self::check_preconditions(request) {
            return failed;
        }

        info!(
            "Dispatching {} analysis for survey {} ({} responses)",
            request.method,
            request.survey.id,
            request.responses.len()
        );

        match self.run(request).await {
            Ok(result) => {
                info!("{} analysis for survey {} completed", request.method, request.survey.id);
                result
            }
            Err(err) => {
                error!("Error analyzing responses for survey {}: {}", request.survey.id, err);
                AnalysisResult::failed(request.method, failure_summary(&err))
            }
        }
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let generation = PromptBuilder::analysis(
            &request.survey,
            &request.responses,
            request.language,
            request.method,
            request.vision(),
        );

        let text = call_with_retry(&self.retry, || self.generator.generate(&generation)).await?;
        let value = parse_structured(&text)?;
        let raw: RawAnalysis = serde_json::from_value(value)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let (summary, payload) = raw.into_result(request.method)?;
        Ok(AnalysisResult::completed(summary, payload))
    }
}

/// Human readable failure summary for a generation error.
pub fn failure_summary(err: &GenerationError) -> String {
    if err.is_rate_limit() {
        RATE_LIMIT_SUMMARY.to_string()
    } else {
        format!("Could not generate analysis. {}", err)
    }
}

/// Structured output as returned by the service.
///
/// `summary` and the payload fields of the requested method are required;
/// list fields that belong to a required payload may be empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    summary: Option<String>,

    comprehensive_diagnosis: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    improvement_strategies: Vec<String>,
    #[serde(default)]
    key_themes: Vec<String>,
    sentiment_score: Option<f64>,
    #[serde(default)]
    recommendations: Vec<String>,

    ipa_data: Option<Vec<IpaPoint>>,
    box_plot_data: Option<Vec<BoxPlotRow>>,
    mca_data: Option<Vec<CorrespondencePoint>>,
    demographic_insights: Option<Vec<String>>,
    vision_analysis: Option<VisionAlignment>,
}

impl RawAnalysis {
    /// Split into the summary and the payload of `method`.
    fn into_result(self, method: AnalysisMethod) -> Result<(String, AnalysisPayload)> {
        let summary = required(self.summary, "summary")?;
        let payload = match method {
            AnalysisMethod::Comprehensive => AnalysisPayload::Comprehensive(ComprehensiveReport {
                comprehensive_diagnosis: required(self.comprehensive_diagnosis, "comprehensiveDiagnosis")?,
                strengths: self.strengths,
                weaknesses: self.weaknesses,
                improvement_strategies: self.improvement_strategies,
                key_themes: self.key_themes,
                sentiment_score: clamp_score(required(self.sentiment_score, "sentimentScore")?),
                recommendations: self.recommendations,
            }),
            AnalysisMethod::ImportancePerformance => {
                AnalysisPayload::ImportancePerformance(required(self.ipa_data, "ipaData")?)
            }
            AnalysisMethod::StatisticalSpread => {
                AnalysisPayload::StatisticalSpread(required(self.box_plot_data, "boxPlotData")?)
            }
            AnalysisMethod::Correspondence => {
                AnalysisPayload::Correspondence(required(self.mca_data, "mcaData")?)
            }
            AnalysisMethod::Demographic => {
                AnalysisPayload::Demographic(required(self.demographic_insights, "demographicInsights")?)
            }
            AnalysisMethod::VisionAlignment => {
                let mut vision = required(self.vision_analysis, "visionAnalysis")?;
                vision.alignment_score = vision.alignment_score.clamp(0.0, 100.0);
                AnalysisPayload::VisionAlignment(vision)
            }
        };
        Ok((summary, payload))
    }
}

fn required<T>(field: Option<T>, name: &str) -> Result<T> {
    field.ok_or_else(|| GenerationError::MalformedResponse(format!("missing field `{}`", name)))
}

fn clamp_score(score: f64) -> u8 {
    score.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_core::{AnalysisStatus, Question};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::generation::GenerationRequest;

    /// Replays canned outputs in order.
    struct Scripted {
        outputs: Mutex<VecDeque<Result<String>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outputs: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self { outputs: Mutex::new(outputs.into()), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for Scripted {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy { initial_delay_ms: 1, ..Default::default() }
    }

    fn request(method: AnalysisMethod) -> AnalysisRequest {
        let q = Question::likert("Dining");
        let survey = Survey::new("Campus", "").with_question(q.clone());
        let responses = vec![SurveyResponse::new(survey.id).with_answer(q.id, 4)];
        AnalysisRequest::new(survey, responses, method)
    }

    #[tokio::test]
    async fn test_comprehensive_result_is_parsed_and_clamped() {
        let generator = Scripted::new(vec![Ok(r#"```json
{"summary":"Mostly positive","method":"BASIC","comprehensiveDiagnosis":"Food drives scores",
 "strengths":["Staff"],"weaknesses":["Prices"],"improvementStrategies":["Subsidize"],
 "keyThemes":["food"],"sentimentScore":130}
```"#
            .to_string())]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::Comprehensive)).await;
        assert_eq!(result.status(), AnalysisStatus::Completed);
        assert_eq!(result.summary, "Mostly positive");
        assert_eq!(result.sentiment_score(), Some(100));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_ipa_points_parsed() {
        let generator = Scripted::new(vec![Ok(
            r#"{"summary":"s","method":"IPA","ipaData":[{"label":"Dining","importance":4.5,"performance":2.0}]}"#
                .to_string(),
        )]);
        let dispatcher = AnalysisDispatcher::new(generator, fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::ImportancePerformance)).await;
        match result.payload() {
            Some(AnalysisPayload::ImportancePerformance(points)) => {
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].label, "Dining");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_insight_list_is_completed() {
        let generator = Scripted::new(vec![Ok(
            r#"{"summary":"No clear segments","method":"DEMOGRAPHIC","demographicInsights":[]}"#.to_string(),
        )]);
        let dispatcher = AnalysisDispatcher::new(generator, fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::Demographic)).await;
        assert_eq!(result.status(), AnalysisStatus::Completed);
        assert_eq!(result.payload(), Some(&AnalysisPayload::Demographic(vec![])));
    }

    #[tokio::test]
    async fn test_vision_without_statement_fails_without_calling_service() {
        let generator = Scripted::new(vec![]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let blank = University::new("Hanbit", "Seoul", 1200).with_vision("   ");
        let req = request(AnalysisMethod::VisionAlignment).with_university(Some(blank));
        let result = dispatcher.dispatch(&req).await;

        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.summary.contains("vision"));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_gets_quota_summary() {
        let quota = || Err(GenerationError::Api { code: Some(429), message: "quota".into() });
        let generator = Scripted::new(vec![quota(), quota(), quota(), quota()]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::Correspondence)).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert_eq!(result.summary, RATE_LIMIT_SUMMARY);
        assert!(result.payload().is_none());
        assert_eq!(generator.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_reply_fails() {
        let generator = Scripted::new(vec![Ok(String::new())]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::Comprehensive)).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.payload().is_none());
        assert!(result.summary.starts_with("Could not generate analysis. "));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_missing_method_fields_fails() {
        let generator = Scripted::new(vec![
            Ok(r#"{"summary":"Looks fine","method":"BASIC","strengths":["Staff"]}"#.to_string()),
            Ok(r#"{"method":"IPA","ipaData":[]}"#.to_string()),
            Ok(r#"{"summary":"Aligned","method":"VISION"}"#.to_string()),
        ]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::Comprehensive)).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.summary.contains("comprehensiveDiagnosis"));

        let result = dispatcher.dispatch(&request(AnalysisMethod::ImportancePerformance)).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.summary.contains("summary"));

        let hanbit = University::new("Hanbit", "Seoul", 1200).with_vision("Global leaders");
        let req = request(AnalysisMethod::VisionAlignment).with_university(Some(hanbit));
        let result = dispatcher.dispatch(&req).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.summary.contains("visionAnalysis"));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_malformed_output_fails_immediately() {
        let generator = Scripted::new(vec![Ok("I could not analyze this.".to_string())]);
        let dispatcher = AnalysisDispatcher::new(generator.clone(), fast_retry());

        let result = dispatcher.dispatch(&request(AnalysisMethod::StatisticalSpread)).await;
        assert_eq!(result.status(), AnalysisStatus::Failed);
        assert!(result.summary.starts_with("Could not generate analysis. "));
        assert_eq!(generator.calls(), 1);
    }
}
