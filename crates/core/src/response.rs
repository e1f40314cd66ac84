//! Respondent answers.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::id::{QuestionId, ResponseId, SurveyId};
use crate::Time;

/// One respondent's submission. Append-only once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    /// Unique identifier
    pub id: ResponseId,

    /// Owning survey
    pub survey_id: SurveyId,

    /// Answers keyed by question
    pub answers: HashMap<QuestionId, Answer>,

    /// Submission time
    pub submitted_at: Time,
}

impl SurveyResponse {
    /// Create an empty response for a survey.
    pub fn new(survey_id: SurveyId) -> Self {
        Self {
            id: ResponseId::new(),
            survey_id,
            answers: HashMap::new(),
            submitted_at: chrono::Utc::now(),
        }
    }

    /// Record an answer.
    pub fn with_answer(mut self, question_id: QuestionId, answer: impl Into<Answer>) -> Self {
        self.answers.insert(question_id, answer.into());
        self
    }

    /// Answer for a question.
    pub fn answer(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }
}

/// An answer value: a number, a string, or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Likert score or other numeric input
    Number(f64),
    /// Free text or a single choice
    Text(String),
    /// Multi-select choices
    List(Vec<String>),
}

impl Answer {
    /// Numeric value, only for numeric answers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Number(n) => write!(f, "{}", n),
            Answer::Text(s) => f.write_str(s),
            Answer::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Answer::Number(value)
    }
}

impl From<i32> for Answer {
    fn from(value: i32) -> Self {
        Answer::Number(value as f64)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Answer::Text(value)
    }
}

impl From<Vec<String>> for Answer {
    fn from(value: Vec<String>) -> Self {
        Answer::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_untagged_forms() {
        let n: Answer = serde_json::from_str("4").unwrap();
        assert_eq!(n.as_number(), Some(4.0));

        let s: Answer = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(s.as_number(), None);

        let l: Answer = serde_json::from_str("[\"Dining\",\"Library\"]").unwrap();
        assert_eq!(l.to_string(), "Dining, Library");
    }

    #[test]
    fn test_integer_display_has_no_fraction() {
        assert_eq!(Answer::from(5).to_string(), "5");
        assert_eq!(Answer::from(3.5).to_string(), "3.5");
    }
}
