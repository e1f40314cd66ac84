//! Per-method slot state machine.
//!
//! A slot is the single live record a survey holds for one method:
//! `Empty -> Pending -> {Completed, Failed}`, with `Failed -> Pending` on
//! invoke and any state `-> Pending` on retry.

use pulse_core::{AnalysisId, AnalysisMethod, AnalysisResult, AnalysisStatus};

/// Current state of one method slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No record for the method
    Empty,
    /// Waiting for a background call
    Pending(AnalysisId),
    /// Finished with a payload
    Completed(AnalysisId),
    /// Finished without a payload
    Failed(AnalysisId),
}

impl SlotState {
    /// Read the slot for `method` from a survey's history.
    pub fn of(history: &[AnalysisResult], method: AnalysisMethod) -> Self {
        match history.iter().find(|r| r.method == method) {
            None => SlotState::Empty,
            Some(record) => match record.status() {
                AnalysisStatus::Pending => SlotState::Pending(record.id),
                AnalysisStatus::Completed => SlotState::Completed(record.id),
                AnalysisStatus::Failed => SlotState::Failed(record.id),
            },
        }
    }

    /// Record occupying the slot.
    pub fn record_id(&self) -> Option<AnalysisId> {
        match self {
            SlotState::Empty => None,
            SlotState::Pending(id) | SlotState::Completed(id) | SlotState::Failed(id) => Some(*id),
        }
    }

    /// Whether the slot holds a pending or completed record.
    pub fn is_live(&self) -> bool {
        matches!(self, SlotState::Pending(_) | SlotState::Completed(_))
    }
}

/// User-driven slot events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    /// Open a method tab
    Invoke,
    /// Regenerate the displayed record
    Retry,
}

/// What to do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    /// Show the existing record, issue nothing
    Reuse(AnalysisId),
    /// Insert a new pending record and dispatch
    Dispatch,
}

/// Slot transition rules.
pub struct SlotMachine;

impl SlotMachine {
    /// Decide the action for `event` in `state`.
    pub fn next(state: SlotState, event: SlotEvent) -> SlotAction {
        match (event, state.record_id()) {
            // Retry always recomputes
            (SlotEvent::Retry, _) => SlotAction::Dispatch,

            // Live records are shown as-is
            (SlotEvent::Invoke, Some(id)) if state.is_live() => SlotAction::Reuse(id),

            // Empty and failed slots run a new request
            (SlotEvent::Invoke, _) => SlotAction::Dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::AnalysisPayload;

    #[test]
    fn test_slot_reads_most_recent_record() {
        let newer = AnalysisResult::pending(AnalysisMethod::Demographic);
        let older = AnalysisResult::failed(AnalysisMethod::Demographic, "old");
        let history = vec![newer.clone(), older];

        assert_eq!(SlotState::of(&history, AnalysisMethod::Demographic), SlotState::Pending(newer.id));
        assert_eq!(SlotState::of(&history, AnalysisMethod::Correspondence), SlotState::Empty);
    }

    #[test]
    fn test_invoke_reuses_live_records() {
        let done = AnalysisResult::completed("ok", AnalysisPayload::Demographic(vec![]));
        let state = SlotState::of(std::slice::from_ref(&done), AnalysisMethod::Demographic);

        assert_eq!(SlotMachine::next(state, SlotEvent::Invoke), SlotAction::Reuse(done.id));
        assert_eq!(SlotMachine::next(state, SlotEvent::Retry), SlotAction::Dispatch);

        let pending = SlotState::Pending(AnalysisId::new());
        assert!(pending.is_live());
        assert_eq!(SlotMachine::next(pending, SlotEvent::Invoke), SlotAction::Reuse(pending.record_id().unwrap()));
    }

    #[test]
    fn test_invoke_dispatches_for_empty_and_failed() {
        let failed = SlotState::Failed(AnalysisId::new());
        assert!(!failed.is_live());
        assert_eq!(SlotMachine::next(SlotState::Empty, SlotEvent::Invoke), SlotAction::Dispatch);
        assert_eq!(SlotMachine::next(failed, SlotEvent::Invoke), SlotAction::Dispatch);
    }
}
