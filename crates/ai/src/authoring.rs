//! Survey authoring helpers: draft questions and welcome messages.
//!
//! Both helpers degrade to an empty result when generation fails so the
//! editor can fall back to manual input.

use std::sync::Arc;
use pulse_core::{Language, Question, QuestionType, RetryPolicy};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::generation::{
    parse_structured, GenerationError, GenerationRequest, GenerationService, Result,
};
use crate::retry::call_with_retry;

/// Question types the generator may propose.
const DRAFT_TYPES: [QuestionType; 5] = [
    QuestionType::Likert,
    QuestionType::OpenEnded,
    QuestionType::MultipleChoice,
    QuestionType::MultipleSelect,
    QuestionType::Section,
];

/// Generation-backed authoring helpers.
#[derive(Clone)]
pub struct AuthoringAssistant {
    generator: Arc<dyn GenerationService>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct DraftQuestion {
    text: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(default)]
    options: Vec<String>,
}

impl AuthoringAssistant {
    /// Create an assistant.
    pub fn new(generator: Arc<dyn GenerationService>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// Draft `count` questions for a topic. Empty on failure.
    pub async fn generate_survey_questions(
        &self,
        topic: &str,
        description: &str,
        language: Language,
        count: usize,
    ) -> Vec<Question> {
        match self.try_generate_questions(topic, description, language, count).await {
            Ok(questions) => questions,
            Err(err) => {
                error!("Error generating questions: {}", err);
                Vec::new()
            }
        }
    }

    /// Draft a welcome message for the survey start screen. Empty on failure.
    pub async fn generate_intro_message(
        &self,
        topic: &str,
        description: &str,
        language: Language,
    ) -> String {
        let lang = match language {
            Language::Ko => "Write the message in polite and encouraging Korean (honorifics).",
            Language::En => "Write the message in professional and welcoming English.",
        };
        let request = GenerationRequest::text(format!(
            "Write a warm, professional, and encouraging welcome message for the start page of a university survey.

Survey Title: \"{topic}\"
Context/Goal: \"{description}\"

Requirements:
1. Keep it under 100 words.
2. Explain why their opinion matters.
3. Mention it will take only a few minutes.
4. Assure anonymity if relevant.
5. {lang}"
        ));

        match call_with_retry(&self.retry, || self.generator.generate(&request)).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                error!("Error generating intro message: {}", err);
                String::new()
            }
        }
    }

    async fn try_generate_questions(
        &self,
        topic: &str,
        description: &str,
        language: Language,
        count: usize,
    ) -> Result<Vec<Question>> {
        let lang = match language {
            Language::Ko => "Write the questions in Korean.",
            Language::En => "Write the questions in English.",
        };
        let prompt = format!(
            "Generate a list of exactly {count} high-quality university survey questions for the topic: \"{topic}\".
Use the following context/description to tailor the questions: \"{description}\".

Include a mix of:
1. Likert scale (1-5) questions (majority)
2. Open Ended questions (1 or 2 at the end)
3. Multiple Choice or Multiple Select questions if relevant.
4. Suggest a 'SECTION' type if a logical grouping makes sense (e.g. 'Demographics' or 'Satisfaction').

{lang}"
        );
        let type_names: Vec<serde_json::Value> = DRAFT_TYPES
            .iter()
            .map(|t| serde_json::to_value(t))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "text": { "type": "STRING", "description": "The text of the question or section header" },
                    "type": { "type": "STRING", "enum": type_names },
                    "options": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Options for multiple choice/select questions, empty if not applicable"
                    }
                },
                "required": ["text", "type"]
            }
        });
        let request = GenerationRequest::structured(prompt, schema);

        let text = call_with_retry(&self.retry, || self.generator.generate(&request)).await?;
        let value = match parse_structured(&text)? {
            serde_json::Value::Object(map) if map.is_empty() => json!([]),
            value => value,
        };
        let drafts: Vec<DraftQuestion> = serde_json::from_value(value)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        Ok(drafts
            .into_iter()
            .map(|d| Question::new(d.text, d.question_type).with_options(d.options))
            .collect())
    }
}
