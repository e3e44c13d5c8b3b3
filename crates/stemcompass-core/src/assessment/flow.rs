//! Drives an [`AssessmentSession`] against its collaborators.
//!
//! The session decides *what* happens; the flow performs the I/O around
//! each transition: fetching questions, recording responses, requesting the
//! analysis once the session completes, saving the result locally and
//! forwarding it to the student's account.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::analysis::{AnalysisRequester, AnalysisResult};
use super::persistence::{AssessmentRecord, PersistOutcome, PersistenceBridge, UserIdentity};
use super::session::{AssessmentSession, SessionPhase};
use crate::collaborators::{
    AccountCollaborator, AnalysisCollaborator, BackendClient, DiscardingRecorder, QuestionSource,
    ResponseRecorder, StaticQuestionSource,
};
use crate::error::{CollaboratorError, ValidationError};
use crate::events::Event;
use crate::storage::{AssessmentRepository, Config, QuestionSourceKind};

/// The four collaborators a flow talks to.
#[derive(Clone)]
pub struct FlowCollaborators {
    pub questions: Arc<dyn QuestionSource>,
    pub recorder: Arc<dyn ResponseRecorder>,
    pub analysis: Arc<dyn AnalysisCollaborator>,
    pub account: Arc<dyn AccountCollaborator>,
}

impl FlowCollaborators {
    /// Wire every collaborator to the configured backend, with questions
    /// from either the backend or the bundled bank.
    ///
    /// # Errors
    /// Returns an error if the backend client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, CollaboratorError> {
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        // Bundled sessions are unknown to the backend, so their responses
        // have nowhere to go.
        let questions: Arc<dyn QuestionSource>;
        let recorder: Arc<dyn ResponseRecorder>;
        match config.session.question_source {
            QuestionSourceKind::Backend => {
                questions = backend.clone();
                recorder = backend.clone();
            }
            QuestionSourceKind::Static => {
                questions = Arc::new(StaticQuestionSource::new());
                recorder = Arc::new(DiscardingRecorder);
            }
        }
        Ok(Self {
            questions,
            recorder,
            analysis: backend.clone(),
            account: backend,
        })
    }
}

/// What happened after the final answer.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub analysis: AnalysisResult,
    /// Set when the local fallback replaced the collaborator's analysis.
    pub notice: Option<String>,
    pub persistence: PersistOutcome,
    /// Non-fatal problems (local save, account save).
    pub warnings: Vec<String>,
}

/// Result of one answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub events: Vec<Event>,
    pub completion: Option<CompletionReport>,
}

pub struct AssessmentFlow {
    session: AssessmentSession,
    questions: Arc<dyn QuestionSource>,
    recorder: Arc<dyn ResponseRecorder>,
    requester: AnalysisRequester,
    bridge: PersistenceBridge,
    repository: Box<dyn AssessmentRepository>,
    identity: Option<UserIdentity>,
    advance_delay: Duration,
}

impl AssessmentFlow {
    pub fn new(
        session: AssessmentSession,
        collaborators: FlowCollaborators,
        repository: Box<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            session,
            questions: collaborators.questions,
            recorder: collaborators.recorder,
            requester: AnalysisRequester::new(collaborators.analysis),
            bridge: PersistenceBridge::new(collaborators.account),
            repository,
            identity: None,
            advance_delay: Duration::ZERO,
        }
    }

    pub fn with_identity(mut self, identity: Option<UserIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    /// Fetch questions if the session is waiting for them (initially or
    /// after a failed attempt).
    pub async fn load(&mut self) -> Option<Event> {
        if !matches!(
            self.session.phase(),
            SessionPhase::Loading | SessionPhase::LoadFailed
        ) {
            return None;
        }
        match self.questions.fetch_questions().await {
            Ok(set) => self.session.questions_loaded(set),
            Err(e) => {
                warn!(source = self.questions.name(), error = %e, "failed to load questions");
                self.session.questions_failed(&e)
            }
        }
    }

    /// Answer the current question. A first answer is forwarded to the
    /// response recorder; the final one also runs completion.
    ///
    /// # Errors
    /// Returns a validation error if the option does not exist.
    pub async fn answer(&mut self, option: usize) -> Result<AnswerOutcome, ValidationError> {
        let question_index = self.session.current_index();
        let mut events = self.session.select_option(option)?;
        if events.is_empty() {
            return Ok(AnswerOutcome {
                events,
                completion: None,
            });
        }

        if let Some(session_id) = self.session.session_id() {
            if let Err(e) = self
                .recorder
                .record_response(session_id, question_index, option)
                .await
            {
                warn!(session_id, question_index, error = %e, "failed to record response");
            }
        }

        let completion = if self.session.phase() == SessionPhase::Completed {
            let report = self.complete().await;
            if let Some(event) = self.analysis_event() {
                events.push(event);
            }
            report
        } else {
            if !self.advance_delay.is_zero() {
                tokio::time::sleep(self.advance_delay).await;
            }
            None
        };

        Ok(AnswerOutcome { events, completion })
    }

    /// Run analysis and persistence for a completed session. Does nothing
    /// (returns `None`) unless this is the first call after completion.
    pub async fn complete(&mut self) -> Option<CompletionReport> {
        let request = self.session.take_analysis_request()?;
        let outcome = self.requester.request(&request).await;
        let notice = outcome.notice();
        self.session.analysis_received(outcome.result);
        let analysis = self.session.analysis()?.clone();

        let mut warnings = Vec::new();
        let completed_at = self.session.completed_at().unwrap_or_else(Utc::now);
        let record = AssessmentRecord::new(
            request.session_id,
            self.identity.as_ref(),
            analysis.clone(),
            completed_at,
        );

        if let Err(e) = self.repository.save(&record) {
            warn!(session_id = %record.session_id, error = %e, "failed to save assessment locally");
            warnings.push(format!("Your result could not be saved on this device: {e}"));
        }

        let persistence = self.bridge.persist(self.identity.as_ref(), &record).await;
        if let PersistOutcome::Failed { warning } = &persistence {
            warnings.push(warning.clone());
        }

        Some(CompletionReport {
            analysis,
            notice,
            persistence,
            warnings,
        })
    }

    pub fn previous(&mut self) -> Option<Event> {
        self.session.previous()
    }

    pub fn next(&mut self) -> Option<Event> {
        self.session.next()
    }

    pub fn go_to(&mut self, index: usize) -> Option<Event> {
        self.session.go_to(index)
    }

    /// Throw the session away and fetch a fresh question set.
    pub async fn retake(&mut self) -> Vec<Event> {
        let mut events: Vec<Event> = self.session.reset().into_iter().collect();
        events.extend(self.load().await);
        events
    }

    fn analysis_event(&self) -> Option<Event> {
        let analysis = self.session.analysis()?;
        Some(Event::AnalysisReceived {
            primary_field: analysis.primary_field,
            secondary_field: analysis.secondary_field,
            origin: analysis.origin,
            at: Utc::now(),
        })
    }
}
