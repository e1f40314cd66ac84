//! Analysis session: the orchestrator behind a survey's analysis panel.
//!
//! Every user action is a read-modify-write of the whole survey under one
//! store lock. Background calls are spawned tasks that finalize their own
//! pending record when they resolve; a superseded request finds its record
//! gone and leaves history alone.

use std::collections::HashMap;
use std::sync::Arc;
use pulse_ai::{AnalysisDispatcher, AnalysisRequest};
use pulse_core::{AnalysisId, AnalysisMethod, AnalysisResult, Language, SurveyId};
use pulse_storage::{Storage, StorageError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::reconciler::HistoryReconciler;
use crate::slot::{SlotAction, SlotEvent, SlotMachine, SlotState};
use crate::stats::{compute_stats, QuestionStats};
use crate::token::{RequestToken, TokenIssuer};
use crate::view::{Projection, ViewState};

/// Summary for a background call that never produced a result.
pub const GENERATION_FAILED_SUMMARY: &str = "Analysis generation failed.";

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown survey
    #[error("survey not found: {0}")]
    SurveyNotFound(SurveyId),

    /// Unknown analysis record
    #[error("analysis not found: {0}")]
    AnalysisNotFound(AnalysisId),

    /// The survey has no responses yet
    #[error("no responses to analyze")]
    NoResponses,

    /// No record is displayed, so there is nothing to regenerate
    #[error("no analysis selected to retry")]
    NothingToRetry,

    /// Storage failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// What an invoke or retry did.
#[derive(Debug)]
pub enum InvokeOutcome {
    /// An existing live record is now displayed
    Reused(AnalysisId),

    /// A precondition failed; a FAILED record was written
    Failed(AnalysisId),

    /// A pending record was written and a background call started
    Dispatched {
        /// Request ticket
        token: RequestToken,
        /// Resolves to the final record once it has been reconciled
        handle: JoinHandle<AnalysisResult>,
    },
}

impl InvokeOutcome {
    /// Record now displayed.
    pub fn analysis_id(&self) -> AnalysisId {
        match self {
            InvokeOutcome::Reused(id) | InvokeOutcome::Failed(id) => *id,
            InvokeOutcome::Dispatched { token, .. } => token.analysis_id,
        }
    }

    /// Wait for a dispatched call. `None` for reused or failed outcomes.
    pub async fn finished(self) -> Option<AnalysisResult> {
        match self {
            InvokeOutcome::Dispatched { handle, .. } => match handle.await {
                Ok(result) => Some(result),
                Err(err) => {
                    error!("Analysis task join failed: {}", err);
                    None
                }
            },
            _ => None,
        }
    }
}

/// Per-process analysis orchestrator over a shared store.
pub struct AnalysisSession<S: Storage + 'static> {
    store: Arc<Mutex<S>>,
    dispatcher: AnalysisDispatcher,
    tokens: Arc<TokenIssuer>,
    in_flight: Arc<Mutex<InFlight>>,
    views: Arc<Mutex<HashMap<SurveyId, ViewState>>>,
    language: Language,
}

/// Newest request issued per survey and method.
type InFlight = HashMap<(SurveyId, AnalysisMethod), RequestToken>;

impl<S: Storage + 'static> Clone for AnalysisSession<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
            tokens: Arc::clone(&self.tokens),
            in_flight: Arc::clone(&self.in_flight),
            views: Arc::clone(&self.views),
            language: self.language,
        }
    }
}

impl<S: Storage + 'static> AnalysisSession<S> {
    /// Create a session over a shared store.
    pub fn new(store: Arc<Mutex<S>>, dispatcher: AnalysisDispatcher) -> Self {
        Self {
            store,
            dispatcher,
            tokens: Arc::new(TokenIssuer::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            views: Arc::new(Mutex::new(HashMap::new())),
            language: Language::default(),
        }
    }

    /// Set the output language for new requests.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Shared store.
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// First view of a survey.
    ///
    /// Focuses the most recent record and, once per survey, starts a
    /// comprehensive analysis when history is empty and responses exist.
    pub async fn open(&self, survey_id: SurveyId) -> Result<Option<InvokeOutcome>> {
        let (history, response_count) = {
            let store = self.store.lock().await;
            let survey = store
                .load_survey(survey_id)
                .await?
                .ok_or(SessionError::SurveyNotFound(survey_id))?;
            let responses = store.list_responses(survey_id).await?;
            (survey.analysis_history, responses.len())
        };

        let auto_invoke = {
            let mut views = self.views.lock().await;
            let view = views.entry(survey_id).or_default();
            if view.focus.is_none() {
                view.focus = history.first().map(|r| r.id);
            }
            view.take_auto_invoke(&history, response_count)
        };

        if auto_invoke {
            info!("Auto-starting comprehensive analysis for survey {}", survey_id);
            self.invoke(survey_id, AnalysisMethod::Comprehensive).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Newest unresolved request for a survey's method, if any.
    pub async fn in_flight(&self, survey_id: SurveyId, method: AnalysisMethod) -> Option<RequestToken> {
        self.in_flight.lock().await.get(&(survey_id, method)).copied()
    }

    /// Open a method: show its live record, or start a new request.
    pub async fn invoke(&self, survey_id: SurveyId, method: AnalysisMethod) -> Result<InvokeOutcome> {
        self.start(survey_id, method, SlotEvent::Invoke).await
    }

    /// Regenerate the displayed record's method.
    pub async fn retry(&self, survey_id: SurveyId) -> Result<InvokeOutcome> {
        let method = self
            .project(survey_id)
            .await?
            .method
            .ok_or(SessionError::NothingToRetry)?;
        self.regenerate(survey_id, method).await
    }

    /// Start a new request for `method` regardless of its current state.
    pub async fn regenerate(&self, survey_id: SurveyId, method: AnalysisMethod) -> Result<InvokeOutcome> {
        self.start(survey_id, method, SlotEvent::Retry).await
    }

    /// Display a specific history record.
    pub async fn select(&self, survey_id: SurveyId, analysis_id: AnalysisId) -> Result<()> {
        let survey = self
            .store
            .lock()
            .await
            .load_survey(survey_id)
            .await?
            .ok_or(SessionError::SurveyNotFound(survey_id))?;
        if survey.analysis(analysis_id).is_none() {
            return Err(SessionError::AnalysisNotFound(analysis_id));
        }
        self.focus(survey_id, analysis_id).await;
        Ok(())
    }

    /// Current panel state for a survey.
    pub async fn project(&self, survey_id: SurveyId) -> Result<Projection> {
        let survey = self
            .store
            .lock()
            .await
            .load_survey(survey_id)
            .await?
            .ok_or(SessionError::SurveyNotFound(survey_id))?;
        let view = self.views.lock().await.get(&survey_id).cloned().unwrap_or_default();
        Ok(Projection::derive(&survey.analysis_history, &view))
    }

    /// Descriptive statistics for a survey.
    pub async fn statistics(&self, survey_id: SurveyId) -> Result<Vec<QuestionStats>> {
        let store = self.store.lock().await;
        let survey = store
            .load_survey(survey_id)
            .await?
            .ok_or(SessionError::SurveyNotFound(survey_id))?;
        let responses = store.list_responses(survey_id).await?;
        Ok(compute_stats(&survey, &responses))
    }

    async fn start(&self, survey_id: SurveyId, method: AnalysisMethod, event: SlotEvent) -> Result<InvokeOutcome> {
        let mut store = self.store.lock().await;
        let survey = store
            .load_survey(survey_id)
            .await?
            .ok_or(SessionError::SurveyNotFound(survey_id))?;
        let university = match survey.university_id {
            Some(id) => store.load_university(id).await?,
            None => None,
        };
        let mut request = AnalysisRequest::new(survey, Vec::new(), method)
            .with_language(self.language)
            .with_university(university);

        if let Some(failed) = AnalysisDispatcher::check_preconditions(&request) {
            let id = failed.id;
            warn!("{} analysis for survey {} failed precondition: {}", method, survey_id, failed.summary);
            let updated = HistoryReconciler::insert_pending(&request.survey, failed);
            store.save_survey(&updated).await?;
            drop(store);
            self.in_flight.lock().await.remove(&(survey_id, method));
            self.focus(survey_id, id).await;
            return Ok(InvokeOutcome::Failed(id));
        }

        let state = SlotState::of(&request.survey.analysis_history, method);
        if let SlotAction::Reuse(id) = SlotMachine::next(state, event) {
            drop(store);
            debug!("Reusing {} record {} for survey {}", method, id, survey_id);
            self.focus(survey_id, id).await;
            return Ok(InvokeOutcome::Reused(id));
        }

        request.responses = store.list_responses(survey_id).await?;
        if request.responses.is_empty() {
            return Err(SessionError::NoResponses);
        }

        let (token, pending) = self.tokens.issue(survey_id, method);
        let updated = HistoryReconciler::insert_pending(&request.survey, pending);
        store.save_survey(&updated).await?;
        drop(store);

        self.in_flight.lock().await.insert((survey_id, method), token);
        self.focus(survey_id, token.analysis_id).await;
        info!("Started {} for survey {}", token, survey_id);

        let handle = self.spawn(token, request);
        Ok(InvokeOutcome::Dispatched { token, handle })
    }

    async fn focus(&self, survey_id: SurveyId, analysis_id: AnalysisId) {
        self.views
            .lock()
            .await
            .entry(survey_id)
            .or_default()
            .focus_on(analysis_id);
    }

    fn spawn(&self, token: RequestToken, request: AnalysisRequest) -> JoinHandle<AnalysisResult> {
        let dispatcher = self.dispatcher.clone();
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let views = Arc::clone(&self.views);

        tokio::spawn(async move {
            let call = tokio::spawn(async move { dispatcher.dispatch(&request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(err) => {
                    error!("Analysis task {} aborted: {}", token, err);
                    AnalysisResult::failed(token.method, GENERATION_FAILED_SUMMARY)
                }
            };
            complete(&store, &in_flight, &views, token, result).await
        })
    }
}

/// Reconcile a resolved request into history, or into the view if stale.
async fn complete<S: Storage>(
    store: &Mutex<S>,
    in_flight: &Mutex<InFlight>,
    views: &Mutex<HashMap<SurveyId, ViewState>>,
    token: RequestToken,
    result: AnalysisResult,
) -> AnalysisResult {
    let result = result.with_id(token.analysis_id);

    let applied = {
        let mut store = store.lock().await;
        match store.load_survey(token.survey_id).await {
            Ok(Some(survey)) => match HistoryReconciler::finalize(&survey, &token, result.clone()) {
                Some(updated) => match store.save_survey(&updated).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!("Failed to save {} result: {}", token, e);
                        false
                    }
                },
                None => false,
            },
            Ok(None) => {
                debug!("Survey {} is gone, dropping {}", token.survey_id, token);
                false
            }
            Err(e) => {
                error!("Failed to load survey {} for {}: {}", token.survey_id, token, e);
                false
            }
        }
    };

    let superseded_by = {
        let mut in_flight = in_flight.lock().await;
        let key = (token.survey_id, token.method);
        match in_flight.get(&key).copied() {
            Some(newer) if newer.supersedes(&token) => Some(newer),
            Some(_) => {
                in_flight.remove(&key);
                None
            }
            None => None,
        }
    };

    if applied {
        info!("{} finished as {}", token, result.status());
    } else if let Some(newer) = superseded_by {
        debug!("{} resolved after {} replaced it", token, newer);
    }

    if !applied {
        if let Some(view) = views.lock().await.get_mut(&token.survey_id) {
            if view.focus == Some(token.analysis_id) {
                view.detached = Some(result.clone());
            }
        }
    }

    result
}
