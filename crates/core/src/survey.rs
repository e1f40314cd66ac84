//! Survey model - questions and the analysis history attached to them.

use serde::{Deserialize, Serialize};
use crate::analysis::{AnalysisMethod, AnalysisResult};
use crate::id::{AnalysisId, QuestionId, SurveyId, UniversityId};
use crate::Time;

/// A survey distributed to respondents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    /// Unique identifier
    pub id: SurveyId,

    /// Linked university
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_id: Option<UniversityId>,

    /// Survey title
    pub title: String,

    /// Description (also used as context for generation)
    #[serde(default)]
    pub description: String,

    /// Welcome message for the start screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro_message: Option<String>,

    /// Message for the completion screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_message: Option<String>,

    /// Redirect target after completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    /// Ordered questions
    pub questions: Vec<Question>,

    /// Created at
    pub created_at: Time,

    /// Lifecycle status
    pub status: SurveyStatus,

    /// Past analyses, most recently created first.
    #[serde(default)]
    pub analysis_history: Vec<AnalysisResult>,

    /// Origin of the data
    #[serde(default)]
    pub source: SurveySource,
}

impl Survey {
    /// Create a new draft survey.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: SurveyId::new(),
            university_id: None,
            title: title.into(),
            description: description.into(),
            intro_message: None,
            closing_message: None,
            redirect_url: None,
            questions: Vec::new(),
            created_at: chrono::Utc::now(),
            status: SurveyStatus::Draft,
            analysis_history: Vec::new(),
            source: SurveySource::Internal,
        }
    }

    /// Link the survey to a university.
    pub fn with_university(mut self, university_id: UniversityId) -> Self {
        self.university_id = Some(university_id);
        self
    }

    /// Append a question.
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Likert questions in survey order.
    pub fn likert_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.question_type == QuestionType::Likert)
    }

    /// Find an analysis record by identity.
    pub fn analysis(&self, id: AnalysisId) -> Option<&AnalysisResult> {
        self.analysis_history.iter().find(|r| r.id == id)
    }

    /// The most recent record for a method, if any.
    pub fn latest_for(&self, method: AnalysisMethod) -> Option<&AnalysisResult> {
        self.analysis_history.iter().find(|r| r.method == method)
    }
}

/// Survey lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStatus {
    /// Being edited
    Draft,
    /// Accepting responses
    Active,
    /// Closed
    Completed,
}

/// Where survey data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveySource {
    /// Collected through the survey link
    #[default]
    Internal,
    /// Imported from an external sheet
    External,
}

/// A single survey item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier
    pub id: QuestionId,

    /// Question text (or section header text)
    pub text: String,

    /// Question type
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Options for single/multi choice questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Question {
    /// Create a question of the given type.
    pub fn new(text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: QuestionId::new(),
            text: text.into(),
            question_type,
            options: Vec::new(),
            image_url: None,
        }
    }

    /// Create a Likert (1-5) question.
    pub fn likert(text: impl Into<String>) -> Self {
        Self::new(text, QuestionType::Likert)
    }

    /// Set the option list.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Question type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// 1-5 agreement scale
    Likert,
    /// Free text
    OpenEnded,
    /// Single select
    MultipleChoice,
    /// Multi select
    MultipleSelect,
    /// Section header / divider
    Section,
    /// Intro, outro or image block
    InfoMessage,
}
