//! Descriptive statistics over Likert answers.

use pulse_core::{QuestionId, QuestionType, Survey, SurveyResponse};
use serde::Serialize;

/// Summary row for one Likert question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    /// Question identity
    pub question_id: QuestionId,

    /// Question text
    pub question: String,

    /// Mean, rounded to two decimals
    pub mean: f64,

    /// Population standard deviation, rounded to two decimals
    pub std_dev: f64,

    /// Number of numeric answers
    pub count: usize,

    /// 1-based position among Likert questions
    pub index: usize,
}

/// One row per Likert question in survey order.
///
/// Questions without numeric answers report zeros.
pub fn compute_stats(survey: &Survey, responses: &[SurveyResponse]) -> Vec<QuestionStats> {
    survey
        .questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Likert)
        .enumerate()
        .map(|(i, q)| {
            let values: Vec<f64> = responses
                .iter()
                .filter_map(|r| r.answer(q.id).and_then(|a| a.as_number()))
                .collect();

            let count = values.len();
            let (mean, std_dev) = if count == 0 {
                (0.0, 0.0)
            } else {
                let n = count as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, variance.sqrt())
            };

            QuestionStats {
                question_id: q.id,
                question: q.text.clone(),
                mean: round2(mean),
                std_dev: round2(std_dev),
                count,
                index: i + 1,
            }
        })
        .collect()
}

/// `(mean / 5) * 100` over every numeric Likert answer.
///
/// `None` when there is nothing to average.
pub fn fallback_score(survey: &Survey, responses: &[SurveyResponse]) -> Option<f64> {
    let (sum, count) = survey
        .likert_questions()
        .flat_map(|q| responses.iter().filter_map(move |r| r.answer(q.id).and_then(|a| a.as_number())))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64 / 5.0 * 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::Question;

    fn survey_with(answers: &[i32]) -> (Survey, Vec<SurveyResponse>) {
        let q1 = Question::likert("Overall satisfaction");
        let survey = Survey::new("Campus", "").with_question(q1.clone());
        let responses = answers
            .iter()
            .map(|a| SurveyResponse::new(survey.id).with_answer(q1.id, *a))
            .collect();
        (survey, responses)
    }

    #[test]
    fn test_population_mean_and_std_dev() {
        let (survey, responses) = survey_with(&[4, 5, 3, 4, 5]);
        let stats = compute_stats(&survey, &responses);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].mean, 4.2);
        assert_eq!(stats[0].std_dev, 0.75);
        assert_eq!(stats[0].count, 5);
        assert_eq!(stats[0].index, 1);
    }

    #[test]
    fn test_unanswered_question_is_zero() {
        let (survey, _) = survey_with(&[]);
        let stats = compute_stats(&survey, &[]);
        assert_eq!((stats[0].mean, stats[0].std_dev, stats[0].count), (0.0, 0.0, 0));
        assert!(!stats[0].mean.is_nan());
    }

    #[test]
    fn test_non_likert_questions_skipped_in_numbering() {
        let a = Question::likert("A");
        let comment = Question::new("Why?", QuestionType::OpenEnded);
        let b = Question::likert("B");
        let survey = Survey::new("Campus", "")
            .with_question(a.clone())
            .with_question(comment.clone())
            .with_question(b.clone());
        let responses = vec![SurveyResponse::new(survey.id)
            .with_answer(a.id, 2)
            .with_answer(comment.id, "too loud")
            .with_answer(b.id, "n/a")];

        let stats = compute_stats(&survey, &responses);
        assert_eq!(stats.iter().map(|s| s.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(stats[1].question, "B");
        assert_eq!(stats[1].count, 0);
    }

    #[test]
    fn test_stats_are_pure() {
        let (survey, responses) = survey_with(&[1, 2, 3]);
        let before = (survey.clone(), responses.clone());

        let first = compute_stats(&survey, &responses);
        let second = compute_stats(&survey, &responses);

        assert_eq!(first, second);
        assert_eq!((survey, responses), before);
    }

    #[test]
    fn test_fallback_score() {
        let (survey, responses) = survey_with(&[4, 5, 3, 4, 5]);
        let score = fallback_score(&survey, &responses).unwrap();
        assert!((score - 84.0).abs() < 1e-9);

        let (survey, _) = survey_with(&[]);
        assert_eq!(fallback_score(&survey, &[]), None);
    }
}
