//! Prize draws among a survey's respondents.

use pulse_core::{PrizeDrawId, PrizeDrawRecord, Survey, SurveyResponse};
use rand::seq::SliceRandom;
use rand::Rng;

/// Draw errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// Nobody to draw from
    #[error("survey has no responses to draw from")]
    NoResponses,

    /// Asked for zero winners
    #[error("winner count must be at least 1")]
    ZeroWinners,
}

/// Draw up to `count` distinct winners from the survey's responses.
pub fn draw_winners(
    survey: &Survey,
    responses: &[SurveyResponse],
    count: usize,
    prize_name: Option<String>,
) -> Result<PrizeDrawRecord, DrawError> {
    draw_winners_with(&mut rand::thread_rng(), survey, responses, count, prize_name)
}

/// [`draw_winners`] with a caller-supplied random source.
pub fn draw_winners_with<R: Rng + ?Sized>(
    rng: &mut R,
    survey: &Survey,
    responses: &[SurveyResponse],
    count: usize,
    prize_name: Option<String>,
) -> Result<PrizeDrawRecord, DrawError> {
    if count == 0 {
        return Err(DrawError::ZeroWinners);
    }
    let mut pool: Vec<SurveyResponse> = responses
        .iter()
        .filter(|r| r.survey_id == survey.id)
        .cloned()
        .collect();
    if pool.is_empty() {
        return Err(DrawError::NoResponses);
    }

    pool.shuffle(rng);
    pool.truncate(count);

    Ok(PrizeDrawRecord {
        id: PrizeDrawId::new(),
        survey_id: survey.id,
        survey_title: survey.title.clone(),
        prize_name: prize_name.filter(|p| !p.trim().is_empty()),
        drawn_at: chrono::Utc::now(),
        winner_count: count,
        winners: pool,
    })
}
