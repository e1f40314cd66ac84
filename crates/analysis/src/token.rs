//! Request tokens.
//!
//! Every dispatched analysis carries a token naming the history record it
//! will finalize. A completion is only applied while that record is still the
//! pending occupant of its slot.

use std::sync::atomic::{AtomicU64, Ordering};
use pulse_core::{AnalysisId, AnalysisMethod, AnalysisResult, SurveyId};

/// Ticket for one in-flight analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    /// Survey the request belongs to
    pub survey_id: SurveyId,

    /// Requested method
    pub method: AnalysisMethod,

    /// Identity of the pending record the request will finalize
    pub analysis_id: AnalysisId,

    /// Issue order within the session
    pub seq: u64,
}

impl RequestToken {
    /// Whether this request still owns a pending record in `history`.
    pub fn is_current(&self, history: &[AnalysisResult]) -> bool {
        history
            .iter()
            .any(|r| r.id == self.analysis_id && r.method == self.method && r.is_pending())
    }

    /// Whether this token was issued after `other`.
    pub fn supersedes(&self, other: &RequestToken) -> bool {
        self.seq > other.seq
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}({})", self.method, self.seq, self.analysis_id)
    }
}

/// Issues monotonically numbered tokens with their pending placeholders.
#[derive(Debug, Default)]
pub struct TokenIssuer {
    next: AtomicU64,
}

impl TokenIssuer {
    /// Create an issuer starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token and the PENDING record it refers to.
    pub fn issue(&self, survey_id: SurveyId, method: AnalysisMethod) -> (RequestToken, AnalysisResult) {
        let pending = AnalysisResult::pending(method);
        let token = RequestToken {
            survey_id,
            method,
            analysis_id: pending.id,
            seq: self.next.fetch_add(1, Ordering::SeqCst) + 1,
        };
        (token, pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_monotonic() {
        let issuer = TokenIssuer::new();
        let survey = SurveyId::new();
        let (first, _) = issuer.issue(survey, AnalysisMethod::Comprehensive);
        let (second, _) = issuer.issue(survey, AnalysisMethod::Comprehensive);

        assert_eq!(first.seq, 1);
        assert!(second.supersedes(&first));
        assert_ne!(first.analysis_id, second.analysis_id);
    }

    #[test]
    fn test_token_current_only_while_pending_record_present() {
        let issuer = TokenIssuer::new();
        let (token, pending) = issuer.issue(SurveyId::new(), AnalysisMethod::Demographic);

        let history = vec![pending.clone()];
        assert!(token.is_current(&history));

        let finished = vec![AnalysisResult::failed(AnalysisMethod::Demographic, "x").with_id(pending.id)];
        assert!(!token.is_current(&finished));

        assert!(!token.is_current(&[]));
    }
}
