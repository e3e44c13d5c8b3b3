use async_trait::async_trait;

use crate::assessment::{AnalysisPayload, AssessmentRecord, QuestionSet, ScoreMap};
use crate::error::CollaboratorError;

/// Supplies the ordered question set for a new session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short identifier used in logs (e.g. "backend", "static").
    fn name(&self) -> &str;

    async fn fetch_questions(&self) -> Result<QuestionSet, CollaboratorError>;
}

/// Receives every first-time answer. Callers treat failures as non-fatal.
#[async_trait]
pub trait ResponseRecorder: Send + Sync {
    async fn record_response(
        &self,
        session_id: &str,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), CollaboratorError>;
}

/// Turns a finished session into a raw analysis payload.
#[async_trait]
pub trait AnalysisCollaborator: Send + Sync {
    async fn analyze(
        &self,
        session_id: &str,
        scores: &ScoreMap,
    ) -> Result<AnalysisPayload, CollaboratorError>;
}

/// Stores finished assessments on a student's account.
#[async_trait]
pub trait AccountCollaborator: Send + Sync {
    async fn save_assessment(
        &self,
        user_id: &str,
        record: &AssessmentRecord,
    ) -> Result<(), CollaboratorError>;
}

/// Recorder that drops every response, for offline sessions.
#[derive(Debug, Default)]
pub struct DiscardingRecorder;

#[async_trait]
impl ResponseRecorder for DiscardingRecorder {
    async fn record_response(
        &self,
        _session_id: &str,
        _question_index: usize,
        _option_index: usize,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
