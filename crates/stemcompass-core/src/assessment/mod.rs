mod analysis;
mod category;
mod flow;
mod persistence;
mod question;
mod scoring;
mod session;

pub use analysis::{
    environments_for, local_analysis, AnalysisOrigin, AnalysisOutcome, AnalysisPayload,
    AnalysisRequester, AnalysisResult, GENERIC_SKILLS,
};
pub use category::StemCategory;
pub use flow::{AnswerOutcome, AssessmentFlow, CompletionReport, FlowCollaborators};
pub use persistence::{AssessmentRecord, PersistOutcome, PersistenceBridge, UserIdentity};
pub use question::{Question, QuestionOrigin, QuestionSet, Response, OPTIONS_PER_QUESTION};
pub use scoring::{ScoreMap, SCORE_INCREMENT};
pub use session::{
    AnalysisRequest, AssessmentSession, LoadFailure, LoadFailureKind, SessionPhase,
};
