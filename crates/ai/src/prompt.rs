//! Per-method instructions and output schemas.

use pulse_core::{AnalysisMethod, Language, QuestionType, Survey, SurveyResponse};
use serde_json::{json, Map, Value};

use crate::generation::GenerationRequest;

const KO_STYLE_GUIDE: &str = "[Writing Persona & Style Guide]
You are a Senior Data Analyst at a top-tier satisfaction research agency with 10+ years of experience.
Your report must be:
1. **Highly Professional:** Use formal administrative/business Korean (e.g., '확인됨', '분석됨', '판단됨', '시급함'). Avoid conversational endings like '해요' or '입니다'.
2. **Data-Driven:** Every claim must be backed by the data (percentages, scores). Don't just say \"many students\", say \"65% of students\".
3. **Strategic:** Focus on the 'Why' and 'So What'. Connect findings to institutional goals.
4. **Structural:** Use bullet points and distinct sections for readability.";

const EN_STYLE_GUIDE: &str = "[Writing Persona & Style Guide]
You are a Senior Data Analyst at a top-tier satisfaction research agency with 10+ years of experience.
Your report must be:
1. **Highly Professional:** Use formal business English.
2. **Data-Driven:** Every claim must be backed by the data.
3. **Strategic:** Focus on actionable insights and institutional alignment.";

/// Builds analysis prompts and their response schemas.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Full structured request for one analysis method.
    ///
    /// `vision` is only read for [`AnalysisMethod::VisionAlignment`].
    pub fn analysis(
        survey: &Survey,
        responses: &[SurveyResponse],
        language: Language,
        method: AnalysisMethod,
        vision: Option<&str>,
    ) -> GenerationRequest {
        let prompt = format!(
            "Task: {task}\n\n{style}\n\nContext:\nSurvey Title: {title}\nDescription: {description}\n\nResponses Data:\n{data}",
            task = Self::task(method, vision.unwrap_or_default()),
            style = Self::style_guide(language),
            title = survey.title,
            description = survey.description,
            data = Self::transcript(survey, responses),
        );
        GenerationRequest::structured(prompt, Self::schema(method))
    }

    /// Writing style guide for the output language.
    pub fn style_guide(language: Language) -> &'static str {
        match language {
            Language::Ko => KO_STYLE_GUIDE,
            Language::En => EN_STYLE_GUIDE,
        }
    }

    /// Flatten responses into `Q: .. | A: ..` lines, one block per respondent.
    pub fn transcript(survey: &Survey, responses: &[SurveyResponse]) -> String {
        responses
            .iter()
            .map(|response| {
                survey
                    .questions
                    .iter()
                    .filter(|q| q.question_type != QuestionType::Section)
                    .map(|q| {
                        let answer = response
                            .answer(q.id)
                            .map(|a| a.to_string())
                            .unwrap_or_default();
                        format!("Q: {} | A: {}", q.text, answer)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    /// Analytical procedure for a method.
    pub fn task(method: AnalysisMethod, vision: &str) -> String {
        match method {
            AnalysisMethod::Comprehensive => "Perform a Comprehensive Satisfaction Diagnosis.
1. **Executive Summary:** A briefing for the University President.
2. **Strengths:** Top 3 areas where the institution is excelling, backed by data.
3. **Weaknesses/Pain Points:** Top 3 critical issues requiring immediate attention.
4. **Detailed Diagnosis:** A deeper dive into *why* the scores are the way they are, using open-ended feedback as evidence.
5. **Strategic Action Plan:** Concrete, actionable steps to improve satisfaction scores in the next semester.
6. **Sentiment Score:** Overall index (0-100).
7. **Key Themes:** 5 major topics mentioned."
                .to_string(),

            AnalysisMethod::ImportancePerformance => "Perform a rigorous Importance-Performance Analysis (IPA).
1. Calculate the Performance (Satisfaction) average (1-5) for each Likert item.
2. Infer the Importance (1-5) based on the item's correlation with the overall positive sentiment found in open-ended answers, or explicit importance if available.
3. Classify each item into the 4 Quadrants:
   - Q1: Keep Up (High Imp, High Perf)
   - Q2: Concentrate Here (High Imp, Low Perf) - These are priority fixes.
   - Q3: Low Priority (Low Imp, Low Perf)
   - Q4: Possible Overkill (Low Imp, High Perf)"
                .to_string(),

            AnalysisMethod::StatisticalSpread => "Perform a Statistical Variation Analysis (Box Plot Logic).
For each Likert item report the minimum, first quartile, median, third quartile and maximum on the 1-5 scale.
Identify the spread of responses to understand consensus vs. polarization.
- High variation means the issue is polarizing.
- Low variation with low score means universal dissatisfaction."
                .to_string(),

            AnalysisMethod::Correspondence => "Perform a Multiple Correspondence Analysis (MCA) simulation.
Map relationships between different categorical answers (e.g., choice of 'Cafeteria' as priority linked with 'Dissatisfied' rating).
Identify 2D coordinates to visualize these clusters, with a category label for each point."
                .to_string(),

            AnalysisMethod::Demographic => "Analyze Respondent Characteristics and Segmentation.
Based on the data, identify key user personas or segments.
Describe their distinct behaviors or satisfaction levels."
                .to_string(),

            AnalysisMethod::VisionAlignment => format!(
                "Perform a Deep Strategic Vision Alignment Analysis.

**Context:** The Institution has defined a specific Vision/Mission Statement. Measure how well the current survey results reflect this vision.

**Target Vision/Mission:**
\"{vision}\"

**Analysis Steps:**
1. **Deconstruct Vision:** Break down the vision statement into core values or goals.
2. **Map Evidence:** For each core value, scan the survey data (scores and comments) for evidence of alignment or misalignment.
3. **Gap Analysis:** Identify specific discrepancies between the vision and the survey evidence.
4. **Scoring:** Calculate an 'Alignment Score' (0-100) based on the evidence.

**Output Requirements:**
- **Alignment Summary:** A detailed narrative referencing keywords from the Vision and connecting them to specific survey findings. Conclude on whether the institution is \"on track\".
- **Aligned Areas:** Survey topics where the results validate the vision.
- **Gap Areas:** Survey topics where the results contradict the vision."
            ),
        }
    }

    /// Response schema for a method, in the generation service's schema dialect.
    pub fn schema(method: AnalysisMethod) -> Value {
        let mut properties = Map::new();
        properties.insert(
            "summary".into(),
            json!({
                "type": "STRING",
                "description": "Executive Summary. High-level overview of the most critical findings. Keep it under 200 words."
            }),
        );
        properties.insert("method".into(), json!({ "type": "STRING", "enum": [method.tag()] }));

        let payload_fields: &[&str] = match method {
            AnalysisMethod::Comprehensive => {
                properties.insert("comprehensiveDiagnosis".into(), json!({
                    "type": "STRING",
                    "description": "In-depth analysis paragraph explaining the root causes of the results."
                }));
                properties.insert("strengths".into(), string_list("List of key strengths identified."));
                properties.insert("weaknesses".into(), string_list("List of key weaknesses/issues identified."));
                properties.insert("improvementStrategies".into(), string_list("Concrete strategic recommendations."));
                properties.insert("keyThemes".into(), json!({ "type": "ARRAY", "items": { "type": "STRING" } }));
                properties.insert("sentimentScore".into(), json!({ "type": "INTEGER" }));
                properties.insert("recommendations".into(), string_list("Short bullet points (Legacy support)."));
                &[
                    "comprehensiveDiagnosis",
                    "strengths",
                    "weaknesses",
                    "improvementStrategies",
                    "keyThemes",
                    "sentimentScore",
                ]
            }
            AnalysisMethod::ImportancePerformance => {
                properties.insert("ipaData".into(), object_list(json!({
                    "label": { "type": "STRING" },
                    "importance": { "type": "NUMBER", "description": "Value 1-5" },
                    "performance": { "type": "NUMBER", "description": "Value 1-5" }
                }), &["label", "importance", "performance"]));
                &["ipaData"]
            }
            AnalysisMethod::StatisticalSpread => {
                properties.insert("boxPlotData".into(), object_list(json!({
                    "label": { "type": "STRING" },
                    "min": { "type": "NUMBER" },
                    "q1": { "type": "NUMBER" },
                    "median": { "type": "NUMBER" },
                    "q3": { "type": "NUMBER" },
                    "max": { "type": "NUMBER" }
                }), &["label", "min", "q1", "median", "q3", "max"]));
                &["boxPlotData"]
            }
            AnalysisMethod::Correspondence => {
                properties.insert("mcaData".into(), object_list(json!({
                    "label": { "type": "STRING" },
                    "x": { "type": "NUMBER" },
                    "y": { "type": "NUMBER" },
                    "category": { "type": "STRING" }
                }), &["label", "x", "y", "category"]));
                &["mcaData"]
            }
            AnalysisMethod::Demographic => {
                properties.insert(
                    "demographicInsights".into(),
                    json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
                );
                &["demographicInsights"]
            }
            AnalysisMethod::VisionAlignment => {
                properties.insert("visionAnalysis".into(), json!({
                    "type": "OBJECT",
                    "properties": {
                        "alignmentScore": { "type": "NUMBER", "description": "0 to 100" },
                        "alignmentSummary": {
                            "type": "STRING",
                            "description": "Detailed paragraph analyzing the connection between vision text and survey data."
                        },
                        "alignedAreas": string_list("List of areas where the vision is successfully met."),
                        "gapAreas": string_list("List of areas where there is a gap between vision and reality.")
                    },
                    "required": ["alignmentScore", "alignmentSummary", "alignedAreas", "gapAreas"]
                }));
                &["visionAnalysis"]
            }
        };

        let mut required = vec!["summary"];
        required.extend_from_slice(payload_fields);
        required.push("method");

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        })
    }
}

fn string_list(description: &str) -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" }, "description": description })
}

fn object_list(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "OBJECT", "properties": properties, "required": required }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Question, QuestionType};

    fn sample() -> (Survey, Vec<SurveyResponse>) {
        let section = Question::new("Facilities", QuestionType::Section);
        let score = Question::likert("Library hours");
        let pick = Question::new("Favourite spots", QuestionType::MultipleSelect)
            .with_options(["Library", "Gym"]);
        let comment = Question::new("Anything else?", QuestionType::OpenEnded);
        let survey = Survey::new("Campus", "Spring semester")
            .with_question(section)
            .with_question(score.clone())
            .with_question(pick.clone())
            .with_question(comment);

        let responses = vec![
            SurveyResponse::new(survey.id)
                .with_answer(score.id, 4)
                .with_answer(pick.id, vec!["Library".to_string(), "Gym".to_string()]),
            SurveyResponse::new(survey.id).with_answer(score.id, 2),
        ];
        (survey, responses)
    }

    #[test]
    fn test_transcript_format() {
        let (survey, responses) = sample();
        let text = PromptBuilder::transcript(&survey, &responses);
        assert_eq!(
            text,
            "Q: Library hours | A: 4\nQ: Favourite spots | A: Library, Gym\nQ: Anything else? | A: \n---\n\
             Q: Library hours | A: 2\nQ: Favourite spots | A: \nQ: Anything else? | A: "
        );
        assert!(!text.contains("Facilities"));
    }

    #[test]
    fn test_schema_requires_summary_method_and_payload() {
        for method in AnalysisMethod::ALL {
            let schema = PromptBuilder::schema(method);
            let required: Vec<&str> = schema["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            assert!(required.contains(&"summary"));
            assert!(required.contains(&"method"));
            assert!(required.len() >= 3, "{} has no payload field", method);
            assert_eq!(schema["properties"]["method"]["enum"][0], method.tag());
        }
    }

    #[test]
    fn test_vision_task_embeds_statement() {
        let task = PromptBuilder::task(AnalysisMethod::VisionAlignment, "Creative global talent");
        assert!(task.contains("\"Creative global talent\""));
    }

    #[test]
    fn test_analysis_request_carries_context() {
        let (survey, responses) = sample();
        let request = PromptBuilder::analysis(
            &survey,
            &responses,
            Language::En,
            AnalysisMethod::Demographic,
            None,
        );
        assert!(request.prompt.starts_with("Task: Analyze Respondent Characteristics"));
        assert!(request.prompt.contains("Survey Title: Campus"));
        assert!(request.prompt.contains("formal business English"));
        assert!(request.schema.is_some());
    }
}
