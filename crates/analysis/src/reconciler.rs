//! History reconciliation.
//!
//! Both operations take the current survey and return a whole replacement,
//! which the caller writes back in one store update.

use pulse_core::{AnalysisResult, Survey};
use tracing::debug;

use crate::token::RequestToken;

/// Applies slot updates to a survey's analysis history.
pub struct HistoryReconciler;

impl HistoryReconciler {
    /// Make `record` the only record for its method, at the front of history.
    ///
    /// Used for new pending placeholders and for immediate precondition
    /// failures alike.
    pub fn insert_pending(survey: &Survey, record: AnalysisResult) -> Survey {
        let mut updated = survey.clone();
        updated.analysis_history.retain(|r| r.method != record.method);
        updated.analysis_history.insert(0, record);
        updated
    }

    /// Replace the token's pending record with `result`, in place.
    ///
    /// Returns `None` when the record is no longer pending in history; the
    /// completion is stale and must not be written.
    pub fn finalize(survey: &Survey, token: &RequestToken, result: AnalysisResult) -> Option<Survey> {
        if !token.is_current(&survey.analysis_history) {
            debug!("Dropping stale completion {} for survey {}", token, survey.id);
            return None;
        }

        let mut updated = survey.clone();
        let result = result.with_id(token.analysis_id);
        for slot in updated.analysis_history.iter_mut() {
            if slot.id == token.analysis_id {
                *slot = result;
                break;
            }
        }
        Some(updated)
    }
}
