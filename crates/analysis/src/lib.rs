//! Analysis pipeline for Pulse surveys.
//!
//! Tracks one live analysis record per survey and method, reconciles
//! background results into the survey's history, and derives statistics,
//! dashboard rows and reports from the stored data.

#![warn(missing_docs)]

pub mod token;
pub mod slot;
pub mod reconciler;
pub mod stats;
pub mod view;
pub mod session;
pub mod quadrant;
pub mod overview;
pub mod report;
pub mod prize;

pub use token::{RequestToken, TokenIssuer};
pub use slot::{SlotState, SlotEvent, SlotAction, SlotMachine};
pub use reconciler::HistoryReconciler;
pub use stats::{QuestionStats, compute_stats, fallback_score};
pub use view::{ViewState, ViewPhase, Projection};
pub use session::{AnalysisSession, InvokeOutcome, SessionError, Result, GENERATION_FAILED_SUMMARY};
pub use quadrant::{Quadrant, IPA_MIDPOINT, priority_fixes};
pub use overview::{SurveyOverview, overviews};
pub use report::{ReportError, render_markdown_report};
pub use prize::{DrawError, draw_winners, draw_winners_with};
