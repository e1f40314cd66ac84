//! Prize draw records.

use serde::{Deserialize, Serialize};
use crate::id::{PrizeDrawId, SurveyId};
use crate::response::SurveyResponse;
use crate::Time;

/// A completed prize draw among a survey's respondents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeDrawRecord {
    /// Unique identifier
    pub id: PrizeDrawId,

    /// Survey the winners were drawn from
    pub survey_id: SurveyId,

    /// Survey title at draw time
    pub survey_title: String,

    /// Prize name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_name: Option<String>,

    /// When the draw happened
    pub drawn_at: Time,

    /// Requested number of winners
    pub winner_count: usize,

    /// Winning responses
    pub winners: Vec<SurveyResponse>,
}
