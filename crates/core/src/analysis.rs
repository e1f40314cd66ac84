//! Analysis records and their method-specific payloads.

use serde::{Deserialize, Serialize};
use crate::id::AnalysisId;
use crate::Time;

/// One of the six fixed analytical strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnalysisMethod {
    /// Comprehensive satisfaction diagnosis
    #[serde(rename = "BASIC")]
    Comprehensive,
    /// Importance-performance analysis
    #[serde(rename = "IPA")]
    ImportancePerformance,
    /// Box-plot spread statistics
    #[serde(rename = "BOXPLOT")]
    StatisticalSpread,
    /// Multiple correspondence analysis
    #[serde(rename = "MCA")]
    Correspondence,
    /// Respondent segmentation
    #[serde(rename = "DEMOGRAPHIC")]
    Demographic,
    /// Alignment with the university vision
    #[serde(rename = "VISION")]
    VisionAlignment,
}

impl AnalysisMethod {
    /// All methods in tab order.
    pub const ALL: [AnalysisMethod; 6] = [
        AnalysisMethod::Comprehensive,
        AnalysisMethod::ImportancePerformance,
        AnalysisMethod::StatisticalSpread,
        AnalysisMethod::Correspondence,
        AnalysisMethod::Demographic,
        AnalysisMethod::VisionAlignment,
    ];

    /// Wire tag used in stored history and output schemas.
    pub fn tag(self) -> &'static str {
        match self {
            AnalysisMethod::Comprehensive => "BASIC",
            AnalysisMethod::ImportancePerformance => "IPA",
            AnalysisMethod::StatisticalSpread => "BOXPLOT",
            AnalysisMethod::Correspondence => "MCA",
            AnalysisMethod::Demographic => "DEMOGRAPHIC",
            AnalysisMethod::VisionAlignment => "VISION",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            AnalysisMethod::Comprehensive => "Comprehensive Diagnosis",
            AnalysisMethod::ImportancePerformance => "Importance-Performance Analysis",
            AnalysisMethod::StatisticalSpread => "Statistical Spread",
            AnalysisMethod::Correspondence => "Correspondence Analysis",
            AnalysisMethod::Demographic => "Respondent Characteristics",
            AnalysisMethod::VisionAlignment => "Vision Alignment",
        }
    }
}

impl std::fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for AnalysisMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "BASIC" | "COMPREHENSIVE" => Ok(AnalysisMethod::Comprehensive),
            "IPA" | "IMPORTANCE_PERFORMANCE" => Ok(AnalysisMethod::ImportancePerformance),
            "BOXPLOT" | "STATISTICAL_SPREAD" => Ok(AnalysisMethod::StatisticalSpread),
            "MCA" | "CORRESPONDENCE" => Ok(AnalysisMethod::Correspondence),
            "DEMOGRAPHIC" => Ok(AnalysisMethod::Demographic),
            "VISION" | "VISION_ALIGNMENT" => Ok(AnalysisMethod::VisionAlignment),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Error for unrecognised method names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown analysis method: {0}")]
pub struct UnknownMethod(pub String);

/// Lifecycle status of an analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Waiting for the generation call
    Pending,
    /// Finished with a payload
    Completed,
    /// Finished with an error summary
    Failed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Pending => write!(f, "pending"),
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle state. Only a completed record carries a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisState {
    /// Waiting for the generation call
    Pending,
    /// Finished with a payload
    Completed {
        /// Method-specific result
        payload: AnalysisPayload,
    },
    /// Finished with an error summary
    Failed,
}

/// A single analysis record in a survey's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Local identity
    pub id: AnalysisId,

    /// Creation time
    pub created_at: Time,

    /// Method tag
    pub method: AnalysisMethod,

    /// Natural-language summary (failure text for failed records)
    #[serde(default)]
    pub summary: String,

    /// Lifecycle state and payload
    pub state: AnalysisState,
}

impl AnalysisResult {
    /// Create a pending placeholder for a method.
    pub fn pending(method: AnalysisMethod) -> Self {
        Self {
            id: AnalysisId::new(),
            created_at: chrono::Utc::now(),
            method,
            summary: String::new(),
            state: AnalysisState::Pending,
        }
    }

    /// Create a failed record carrying only a summary.
    pub fn failed(method: AnalysisMethod, summary: impl Into<String>) -> Self {
        Self {
            id: AnalysisId::new(),
            created_at: chrono::Utc::now(),
            method,
            summary: summary.into(),
            state: AnalysisState::Failed,
        }
    }

    /// Create a completed record. The method is taken from the payload.
    pub fn completed(summary: impl Into<String>, payload: AnalysisPayload) -> Self {
        Self {
            id: AnalysisId::new(),
            created_at: chrono::Utc::now(),
            method: payload.method(),
            summary: summary.into(),
            state: AnalysisState::Completed { payload },
        }
    }

    /// Re-address this record under another identity.
    pub fn with_id(mut self, id: AnalysisId) -> Self {
        self.id = id;
        self
    }

    /// Current status.
    pub fn status(&self) -> AnalysisStatus {
        match self.state {
            AnalysisState::Pending => AnalysisStatus::Pending,
            AnalysisState::Completed { .. } => AnalysisStatus::Completed,
            AnalysisState::Failed => AnalysisStatus::Failed,
        }
    }

    /// Payload, present only when completed.
    pub fn payload(&self) -> Option<&AnalysisPayload> {
        match &self.state {
            AnalysisState::Completed { payload } => Some(payload),
            _ => None,
        }
    }

    /// Whether the record is still waiting for its background call.
    pub fn is_pending(&self) -> bool {
        self.status() == AnalysisStatus::Pending
    }

    /// Sentiment index of a completed comprehensive record.
    pub fn sentiment_score(&self) -> Option<u8> {
        match self.payload() {
            Some(AnalysisPayload::Comprehensive(report)) => Some(report.sentiment_score),
            _ => None,
        }
    }
}

/// Method-specific result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum AnalysisPayload {
    /// Comprehensive diagnosis
    #[serde(rename = "BASIC")]
    Comprehensive(ComprehensiveReport),
    /// Importance-performance points
    #[serde(rename = "IPA")]
    ImportancePerformance(Vec<IpaPoint>),
    /// Box-plot rows
    #[serde(rename = "BOXPLOT")]
    StatisticalSpread(Vec<BoxPlotRow>),
    /// Correspondence coordinates
    #[serde(rename = "MCA")]
    Correspondence(Vec<CorrespondencePoint>),
    /// Respondent segment insights
    #[serde(rename = "DEMOGRAPHIC")]
    Demographic(Vec<String>),
    /// Vision alignment
    #[serde(rename = "VISION")]
    VisionAlignment(VisionAlignment),
}

impl AnalysisPayload {
    /// The method this payload belongs to.
    pub fn method(&self) -> AnalysisMethod {
        match self {
            AnalysisPayload::Comprehensive(_) => AnalysisMethod::Comprehensive,
            AnalysisPayload::ImportancePerformance(_) => AnalysisMethod::ImportancePerformance,
            AnalysisPayload::StatisticalSpread(_) => AnalysisMethod::StatisticalSpread,
            AnalysisPayload::Correspondence(_) => AnalysisMethod::Correspondence,
            AnalysisPayload::Demographic(_) => AnalysisMethod::Demographic,
            AnalysisPayload::VisionAlignment(_) => AnalysisMethod::VisionAlignment,
        }
    }
}

/// Comprehensive diagnosis fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    /// Root-cause narrative connecting comments to scores
    pub comprehensive_diagnosis: String,
    /// Top strengths
    pub strengths: Vec<String>,
    /// Top weaknesses
    pub weaknesses: Vec<String>,
    /// Strategic action plan
    pub improvement_strategies: Vec<String>,
    /// Up to five major topics
    pub key_themes: Vec<String>,
    /// Overall index, 0-100
    pub sentiment_score: u8,
    /// Short bullet points kept for older reports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

/// One importance-performance item (both axes on a 1-5 scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpaPoint {
    /// Item name
    pub label: String,
    /// Inferred importance
    pub importance: f64,
    /// Mean score
    pub performance: f64,
}

/// Five-number summary for one Likert item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotRow {
    /// Item name
    pub label: String,
    /// Minimum
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Maximum
    pub max: f64,
}

/// 2D coordinate of a categorical answer cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePoint {
    /// Answer or cluster name
    pub label: String,
    /// First dimension
    pub x: f64,
    /// Second dimension
    pub y: f64,
    /// Variable the answer belongs to
    pub category: String,
}

/// Vision alignment structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionAlignment {
    /// 0-100
    pub alignment_score: f64,
    /// Narrative assessment
    pub alignment_summary: String,
    /// Values the evidence supports
    pub aligned_areas: Vec<String>,
    /// Values the evidence contradicts
    pub gap_areas: Vec<String>,
}
