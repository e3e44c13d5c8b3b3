use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{AnalysisOrigin, LoadFailureKind, SessionPhase, ScoreMap, StemCategory};

/// Every state change of an assessment session produces an Event.
/// Front ends render them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    QuestionsLoaded {
        session_id: String,
        question_count: usize,
        at: DateTime<Utc>,
    },
    QuestionsFailed {
        kind: LoadFailureKind,
        message: String,
        at: DateTime<Utc>,
    },
    AnswerRecorded {
        question_index: usize,
        option_index: usize,
        category: StemCategory,
        scores: ScoreMap,
        at: DateTime<Utc>,
    },
    Navigated {
        from: usize,
        to: usize,
        at: DateTime<Utc>,
    },
    AssessmentCompleted {
        session_id: String,
        scores: ScoreMap,
        at: DateTime<Utc>,
    },
    AnalysisReceived {
        primary_field: StemCategory,
        secondary_field: Option<StemCategory>,
        origin: AnalysisOrigin,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Full state snapshot.
    StateSnapshot {
        phase: SessionPhase,
        session_id: Option<String>,
        current_index: usize,
        question_count: usize,
        answered_count: usize,
        scores: ScoreMap,
        at: DateTime<Utc>,
    },
}
