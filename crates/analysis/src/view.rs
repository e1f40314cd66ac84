//! What to render for a survey's analysis panel.

use pulse_core::{AnalysisId, AnalysisMethod, AnalysisResult, AnalysisStatus};

/// Initialization phase of a survey view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    /// Not yet auto-analyzed
    #[default]
    Fresh,
    /// The one-shot comprehensive analysis has been triggered
    Initialized,
}

/// Locally tracked display state for one survey.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Record the user is looking at
    pub focus: Option<AnalysisId>,

    /// Last known copy of the focused record once it has left history
    pub detached: Option<AnalysisResult>,

    /// Auto-invoke phase
    pub phase: ViewPhase,
}

impl ViewState {
    /// Point the view at a record.
    pub fn focus_on(&mut self, id: AnalysisId) {
        if self.focus != Some(id) {
            self.detached = None;
        }
        self.focus = Some(id);
    }

    /// One-shot initialization transition.
    ///
    /// Returns `true` exactly once: the first time the survey is viewed with
    /// an empty history and at least one response.
    pub fn take_auto_invoke(&mut self, history: &[AnalysisResult], response_count: usize) -> bool {
        match self.phase {
            ViewPhase::Fresh if history.is_empty() && response_count > 0 => {
                self.phase = ViewPhase::Initialized;
                true
            }
            _ => false,
        }
    }
}

/// The derived panel state.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Displayed record
    pub record: Option<AnalysisResult>,

    /// Displayed method
    pub method: Option<AnalysisMethod>,

    /// Displayed status
    pub status: Option<AnalysisStatus>,

    /// Report export is available
    pub can_export: bool,

    /// Regenerate is available
    pub can_regenerate: bool,

    /// Methods with any record, for tab badges
    pub performed: Vec<AnalysisMethod>,
}

impl Projection {
    /// Derive the panel from history and the view's focus.
    ///
    /// The focused record is looked up in history first, then in the detached
    /// copy; without a focus the most recent history entry is shown.
    pub fn derive(history: &[AnalysisResult], view: &ViewState) -> Self {
        let record = match view.focus {
            Some(id) => history
                .iter()
                .find(|r| r.id == id)
                .or_else(|| view.detached.as_ref().filter(|r| r.id == id))
                .or_else(|| history.first()),
            None => history.first(),
        }
        .cloned();

        let status = record.as_ref().map(AnalysisResult::status);
        let mut performed = Vec::new();
        for r in history {
            if !performed.contains(&r.method) {
                performed.push(r.method);
            }
        }

        Self {
            method: record.as_ref().map(|r| r.method),
            can_export: status == Some(AnalysisStatus::Completed),
            can_regenerate: matches!(status, Some(s) if s != AnalysisStatus::Pending),
            status,
            record,
            performed,
        }
    }

    /// Whether the panel shows a spinner.
    pub fn is_pending(&self) -> bool {
        self.status == Some(AnalysisStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::AnalysisPayload;

    #[test]
    fn test_default_focus_is_most_recent() {
        let pending = AnalysisResult::pending(AnalysisMethod::Correspondence);
        let done = AnalysisResult::completed("ok", AnalysisPayload::Demographic(vec![]));
        let history = vec![pending.clone(), done];

        let projection = Projection::derive(&history, &ViewState::default());
        assert_eq!(projection.record.as_ref().map(|r| r.id), Some(pending.id));
        assert!(projection.is_pending());
        assert!(!projection.can_export);
        assert!(!projection.can_regenerate);
        assert_eq!(
            projection.performed,
            vec![AnalysisMethod::Correspondence, AnalysisMethod::Demographic]
        );
    }

    #[test]
    fn test_completed_focus_enables_actions() {
        let done = AnalysisResult::completed("ok", AnalysisPayload::Demographic(vec![]));
        let other = AnalysisResult::pending(AnalysisMethod::Comprehensive);
        let history = vec![other, done.clone()];

        let mut view = ViewState::default();
        view.focus_on(done.id);
        let projection = Projection::derive(&history, &view);
        assert_eq!(projection.method, Some(AnalysisMethod::Demographic));
        assert!(projection.can_export);
        assert!(projection.can_regenerate);
    }

    #[test]
    fn test_detached_record_still_shown() {
        let orphan = AnalysisResult::failed(AnalysisMethod::Demographic, "late failure");
        let mut view = ViewState::default();
        view.focus_on(orphan.id);
        view.detached = Some(orphan.clone());

        let projection = Projection::derive(&[], &view);
        assert_eq!(projection.record, Some(orphan));
        assert!(projection.can_regenerate);
        assert!(!projection.can_export);
    }

    #[test]
    fn test_empty_history_projects_nothing() {
        let projection = Projection::derive(&[], &ViewState::default());
        assert!(projection.record.is_none());
        assert!(!projection.can_regenerate);
    }

    #[test]
    fn test_auto_invoke_fires_once() {
        let mut view = ViewState::default();
        assert!(!view.take_auto_invoke(&[], 0));
        assert!(view.take_auto_invoke(&[], 3));
        assert!(!view.take_auto_invoke(&[], 3));
        assert_eq!(view.phase, ViewPhase::Initialized);
    }

    #[test]
    fn test_auto_invoke_skipped_with_history() {
        let mut view = ViewState::default();
        let history = vec![AnalysisResult::failed(AnalysisMethod::Comprehensive, "x")];
        assert!(!view.take_auto_invoke(&history, 3));
    }
}
