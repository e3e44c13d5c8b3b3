//! Assessment session state machine.
//!
//! Like the rest of the core, the session has no internal threads or
//! timers. The caller feeds it discrete events (questions loaded, option
//! selected, analysis received, reset) and gets back the resulting `Event`s.
//!
//! ## State Transitions
//!
//! ```text
//! Loading -> InProgress -> Completed
//!    |  ^                      |
//!    v  |                      |
//! LoadFailed          reset ---+--> Loading
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = AssessmentSession::new(SCORE_INCREMENT);
//! session.questions_loaded(set);
//! session.select_option(2)?;
//! if let Some(request) = session.take_analysis_request() {
//!     // hand off to the analysis requester exactly once
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::analysis::AnalysisResult;
use super::question::{Question, QuestionSet, Response};
use super::scoring::ScoreMap;
use crate::error::{CollaboratorError, ValidationError};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the question source.
    Loading,
    /// The question source failed; retriable.
    LoadFailed,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailureKind {
    /// The AI-backed generator is rate limited.
    Quota,
    Generic,
}

/// Why the last question fetch failed, with the message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub kind: LoadFailureKind,
    pub message: String,
}

/// Handed out once per completed session to trigger analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub session_id: String,
    pub scores: ScoreMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSession {
    increment: u32,
    phase: SessionPhase,
    #[serde(default)]
    questions: Option<QuestionSet>,
    current_index: usize,
    #[serde(default)]
    answered: Vec<bool>,
    #[serde(default)]
    responses: Vec<Response>,
    #[serde(default)]
    scores: ScoreMap,
    #[serde(default)]
    load_failure: Option<LoadFailure>,
    #[serde(default)]
    analysis_requested: bool,
    #[serde(default)]
    analysis: Option<AnalysisResult>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    /// Create a session in `Loading`, scoring each first answer with
    /// `increment` points.
    pub fn new(increment: u32) -> Self {
        Self {
            increment,
            phase: SessionPhase::Loading,
            questions: None,
            current_index: 0,
            answered: Vec::new(),
            responses: Vec::new(),
            scores: ScoreMap::default(),
            load_failure: None,
            analysis_requested: false,
            analysis: None,
            completed_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn scores(&self) -> ScoreMap {
        self.scores
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn session_id(&self) -> Option<&str> {
        self.questions.as_ref().map(|q| q.session_id.as_str())
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.questions.as_ref()
    }

    pub fn question_count(&self) -> usize {
        self.questions.as_ref().map(|q| q.len()).unwrap_or(0)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.as_ref()?.get(self.current_index)
    }

    pub fn answered_flags(&self) -> &[bool] {
        &self.answered
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answered.get(index).copied().unwrap_or(false)
    }

    pub fn answered_count(&self) -> usize {
        self.answered.iter().filter(|a| **a).count()
    }

    pub fn all_answered(&self) -> bool {
        !self.answered.is_empty() && self.answered.iter().all(|a| *a)
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn load_failure(&self) -> Option<&LoadFailure> {
        self.load_failure.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Check a session restored from storage before driving it further.
    ///
    /// # Errors
    /// Returns a validation error describing the first contradiction found.
    pub fn verify(&self) -> Result<(), ValidationError> {
        let inconsistent = |message: String| Err(ValidationError::InconsistentSession(message));
        let count = self.question_count();
        match self.phase {
            SessionPhase::InProgress | SessionPhase::Completed if self.questions.is_none() => {
                return inconsistent(format!("{:?} session has no questions", self.phase));
            }
            _ => {}
        }
        if self.answered.len() != count {
            return inconsistent(format!(
                "{} answered flags for {count} questions",
                self.answered.len()
            ));
        }
        if count > 0 && self.current_index >= count {
            return inconsistent(format!(
                "current question {} of {count}",
                self.current_index
            ));
        }
        if (self.phase == SessionPhase::Completed) != self.all_answered() {
            return inconsistent("completion does not match answered flags".into());
        }
        Ok(())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            session_id: self.session_id().map(str::to_string),
            current_index: self.current_index,
            question_count: self.question_count(),
            answered_count: self.answered_count(),
            scores: self.scores,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The question source delivered a set. Ignored unless loading.
    pub fn questions_loaded(&mut self, set: QuestionSet) -> Option<Event> {
        match self.phase {
            SessionPhase::Loading | SessionPhase::LoadFailed => {
                let count = set.len();
                let session_id = set.session_id.clone();
                self.answered = vec![false; count];
                self.responses.clear();
                self.scores = ScoreMap::default();
                self.current_index = 0;
                self.questions = Some(set);
                self.load_failure = None;
                self.phase = SessionPhase::InProgress;
                info!(session_id = %session_id, question_count = count, "assessment in progress");
                Some(Event::QuestionsLoaded {
                    session_id,
                    question_count: count,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// The question source failed. The session stays out of `InProgress`
    /// and can be retried with another `questions_loaded`.
    pub fn questions_failed(&mut self, err: &CollaboratorError) -> Option<Event> {
        match self.phase {
            SessionPhase::Loading | SessionPhase::LoadFailed => {
                let kind = if err.is_quota() {
                    LoadFailureKind::Quota
                } else {
                    LoadFailureKind::Generic
                };
                let message = err.user_message();
                self.phase = SessionPhase::LoadFailed;
                self.load_failure = Some(LoadFailure {
                    kind,
                    message: message.clone(),
                });
                Some(Event::QuestionsFailed {
                    kind,
                    message,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Answer the current question.
    ///
    /// Only the first answer to a question scores; selecting again is a
    /// no-op. After a first answer the session either completes (every
    /// question answered) or moves to the next question still open.
    ///
    /// # Errors
    /// Returns a validation error if `option` does not exist on the question.
    pub fn select_option(&mut self, option: usize) -> Result<Vec<Event>, ValidationError> {
        if self.phase != SessionPhase::InProgress {
            return Ok(Vec::new());
        }
        let index = self.current_index;
        if self.is_answered(index) {
            return Ok(Vec::new());
        }
        let category = match self.current_question() {
            Some(q) => q.category_for(option)?,
            None => return Ok(Vec::new()),
        };

        let Some(flag) = self.answered.get_mut(index) else {
            return Err(ValidationError::OutOfBounds {
                collection: "answered flags".into(),
                index,
                len: self.answered.len(),
            });
        };
        *flag = true;
        self.scores = self.scores.with_increment(category, self.increment);
        let now = Utc::now();
        self.responses.push(Response {
            question_index: index,
            option_index: option,
            category,
            answered_at: now,
        });

        let mut events = vec![Event::AnswerRecorded {
            question_index: index,
            option_index: option,
            category,
            scores: self.scores,
            at: now,
        }];

        if self.all_answered() {
            self.phase = SessionPhase::Completed;
            self.completed_at = Some(now);
            let session_id = self.session_id().unwrap_or_default().to_string();
            info!(session_id = %session_id, total = self.scores.total(), "assessment completed");
            events.push(Event::AssessmentCompleted {
                session_id,
                scores: self.scores,
                at: now,
            });
        } else if let Some(next) = self.next_open_after(index) {
            self.current_index = next;
        }
        Ok(events)
    }

    /// Step back one question. Never changes scores or answered flags.
    pub fn previous(&mut self) -> Option<Event> {
        if self.current_index == 0 {
            return None;
        }
        self.go_to(self.current_index - 1)
    }

    /// Step forward one question. Never changes scores or answered flags.
    pub fn next(&mut self) -> Option<Event> {
        self.go_to(self.current_index + 1)
    }

    pub fn go_to(&mut self, index: usize) -> Option<Event> {
        if self.phase != SessionPhase::InProgress || index >= self.question_count() {
            return None;
        }
        let from = self.current_index;
        if from == index {
            return None;
        }
        self.current_index = index;
        Some(Event::Navigated {
            from,
            to: index,
            at: Utc::now(),
        })
    }

    /// Release the analysis request for a completed session. Returns `Some`
    /// at most once per session.
    pub fn take_analysis_request(&mut self) -> Option<AnalysisRequest> {
        if self.phase != SessionPhase::Completed || self.analysis_requested {
            return None;
        }
        self.analysis_requested = true;
        Some(AnalysisRequest {
            session_id: self.session_id()?.to_string(),
            scores: self.scores,
        })
    }

    /// Attach the analysis to a completed session. The embedded scores are
    /// always the session's own.
    pub fn analysis_received(&mut self, mut result: AnalysisResult) -> Option<Event> {
        if self.phase != SessionPhase::Completed || self.analysis.is_some() {
            return None;
        }
        result.scores = self.scores;
        let event = Event::AnalysisReceived {
            primary_field: result.primary_field,
            secondary_field: result.secondary_field,
            origin: result.origin,
            at: Utc::now(),
        };
        self.analysis = Some(result);
        Some(event)
    }

    /// Retake: drop questions, answers and scores and go back to `Loading`.
    pub fn reset(&mut self) -> Option<Event> {
        let increment = self.increment;
        *self = Self::new(increment);
        info!("assessment reset");
        Some(Event::SessionReset { at: Utc::now() })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// First unanswered question after `index`, wrapping around.
    fn next_open_after(&self, index: usize) -> Option<usize> {
        let len = self.answered.len();
        (1..len)
            .map(|offset| (index + offset) % len)
            .find(|i| !self.answered[*i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::category::StemCategory::{self, *};
    use crate::assessment::question::QuestionOrigin;
    use crate::assessment::scoring::SCORE_INCREMENT;

    fn question(index: usize, cats: [StemCategory; 4]) -> Question {
        Question::new(
            index,
            format!("Question {index}"),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            cats.to_vec(),
        )
        .unwrap()
    }

    fn rotating_set(n: usize) -> QuestionSet {
        let questions = (0..n)
            .map(|i| question(i, [Science, Technology, Engineering, Mathematics]))
            .collect();
        QuestionSet::new("session-1", QuestionOrigin::Generated, questions).unwrap()
    }

    fn loaded(n: usize) -> AssessmentSession {
        let mut session = AssessmentSession::new(SCORE_INCREMENT);
        session.questions_loaded(rotating_set(n)).unwrap();
        session
    }

    #[test]
    fn starts_loading() {
        let session = AssessmentSession::new(SCORE_INCREMENT);
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.scores(), ScoreMap::default());
    }

    #[test]
    fn answering_advances_and_scores() {
        let mut session = loaded(3);
        let events = session.select_option(1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.scores().technology, 10);
        assert!(session.is_answered(0));
    }

    #[test]
    fn reselecting_answered_question_is_noop() {
        let mut session = loaded(3);
        session.select_option(0).unwrap();
        session.previous().unwrap();
        let before = session.scores();
        assert!(session.select_option(3).unwrap().is_empty());
        assert_eq!(session.scores(), before);
        assert_eq!(session.responses().len(), 1);
    }

    #[test]
    fn invalid_option_is_rejected_without_side_effects() {
        let mut session = loaded(2);
        assert!(session.select_option(4).is_err());
        assert!(!session.is_answered(0));
        assert!(session.scores().is_zero());
    }

    #[test]
    fn navigation_does_not_touch_scores_or_flags() {
        let mut session = loaded(4);
        session.select_option(0).unwrap();
        let scores = session.scores();
        let flags = session.answered_flags().to_vec();
        session.next().unwrap();
        session.next().unwrap();
        assert!(session.next().is_none());
        session.previous().unwrap();
        session.go_to(0).unwrap();
        assert!(session.previous().is_none());
        assert_eq!(session.scores(), scores);
        assert_eq!(session.answered_flags(), flags.as_slice());
    }

    #[test]
    fn completes_only_when_every_question_answered() {
        let mut session = loaded(3);
        // Answer the last question first.
        session.go_to(2).unwrap();
        session.select_option(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        session.select_option(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        let events = session.select_option(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(matches!(events.last(), Some(Event::AssessmentCompleted { .. })));
        assert!(session.completed_at().is_some());
    }

    #[test]
    fn scenario_science_science_technology_mathematics() {
        let mut session = loaded(4);
        for option in [0, 0, 1, 3] {
            session.select_option(option).unwrap();
        }
        assert_eq!(
            session.scores(),
            ScoreMap {
                science: 20,
                technology: 10,
                engineering: 0,
                mathematics: 10
            }
        );
        assert_eq!(session.phase(), SessionPhase::Completed);
    }

    #[test]
    fn analysis_request_is_released_once() {
        let mut session = loaded(1);
        assert!(session.take_analysis_request().is_none());
        session.select_option(2).unwrap();
        let request = session.take_analysis_request().unwrap();
        assert_eq!(request.session_id, "session-1");
        assert_eq!(request.scores.engineering, 10);
        assert!(session.take_analysis_request().is_none());
    }

    #[test]
    fn quota_failure_keeps_session_out_of_progress() {
        let mut session = AssessmentSession::new(SCORE_INCREMENT);
        let err = CollaboratorError::quota("question-source", "limit reached");
        let event = session.questions_failed(&err).unwrap();
        assert_eq!(session.phase(), SessionPhase::LoadFailed);
        match event {
            Event::QuestionsFailed { kind, message, .. } => {
                assert_eq!(kind, LoadFailureKind::Quota);
                assert!(message.to_lowercase().contains("quota"));
            }
            _ => panic!("Expected QuestionsFailed"),
        }
        assert!(session.select_option(0).unwrap().is_empty());

        // Retry succeeds.
        session.questions_loaded(rotating_set(2)).unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert!(session.load_failure().is_none());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut session = loaded(2);
        session.select_option(0).unwrap();
        session.select_option(1).unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        session.reset().unwrap();
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert!(session.scores().is_zero());
        assert_eq!(session.current_index(), 0);
        assert!(session.answered_flags().iter().all(|a| !a));
        assert!(session.analysis().is_none());
        assert_eq!(session.increment(), SCORE_INCREMENT);
    }

    #[test]
    fn serde_roundtrip_preserves_progress() {
        let mut session = loaded(3);
        session.select_option(3).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let restored: AssessmentSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.scores().mathematics, 10);
        assert_eq!(restored.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let session = loaded(5);
        match session.snapshot() {
            Event::StateSnapshot {
                phase,
                question_count,
                answered_count,
                ..
            } => {
                assert_eq!(phase, SessionPhase::InProgress);
                assert_eq!(question_count, 5);
                assert_eq!(answered_count, 0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
    #[test]
    fn verify_accepts_fresh_and_loaded_sessions() {
        assert!(AssessmentSession::new(SCORE_INCREMENT).verify().is_ok());
        let mut session = loaded(3);
        assert!(session.verify().is_ok());
        for _ in 0..3 {
            session.select_option(0).unwrap();
        }
        assert!(session.verify().is_ok());
    }

    #[test]
    fn verify_rejects_truncated_answered_flags() {
        let mut session = loaded(3);
        session.answered.pop();
        assert!(matches!(
            session.verify(),
            Err(ValidationError::InconsistentSession(_))
        ));
    }

    #[test]
    fn select_on_truncated_flags_errors_instead_of_panicking() {
        let mut session = loaded(3);
        session.answered.clear();
        let err = session.select_option(0).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfBounds { .. }));
        assert!(session.scores().is_zero());
        assert!(session.responses().is_empty());
    }

    #[test]
    fn verify_rejects_completed_session_with_open_questions() {
        let mut session = loaded(2);
        session.phase = SessionPhase::Completed;
        assert!(session.verify().is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Command {
            Select(usize),
            Previous,
            Next,
            GoTo(usize),
        }

        fn command(max_index: usize) -> impl Strategy<Value = Command> {
            prop_oneof![
                (0..OPTIONS).prop_map(Command::Select),
                Just(Command::Previous),
                Just(Command::Next),
                (0..max_index + 2).prop_map(Command::GoTo),
            ]
        }

        const OPTIONS: usize = 4;

        /// Each question maps its options to categories in a different order.
        fn shifted_set(n: usize) -> QuestionSet {
            let questions = (0..n)
                .map(|i| {
                    let mut cats = StemCategory::ALL;
                    cats.rotate_left(i % 4);
                    question(i, cats)
                })
                .collect();
            QuestionSet::new("session-p", QuestionOrigin::Generated, questions).unwrap()
        }

        fn session_with(n: usize) -> AssessmentSession {
            let mut session = AssessmentSession::new(SCORE_INCREMENT);
            session.questions_loaded(shifted_set(n));
            session
        }

        fn scenario() -> impl Strategy<Value = (usize, Vec<Command>)> {
            (1usize..8).prop_flat_map(|n| (Just(n), prop::collection::vec(command(n), 0..60)))
        }

        proptest! {
            #[test]
            fn commands_preserve_session_invariants((n, commands) in scenario()) {
                let mut session = session_with(n);

                for cmd in &commands {
                    let scores = session.scores();
                    let flags = session.answered_flags().to_vec();
                    match cmd {
                        Command::Select(option) => {
                            let was_answered = session.is_answered(session.current_index());
                            let events = session.select_option(*option).unwrap();
                            if was_answered || flags.iter().all(|f| *f) {
                                prop_assert!(events.is_empty());
                                prop_assert_eq!(session.scores(), scores);
                                prop_assert_eq!(session.answered_flags(), &flags[..]);
                            } else {
                                prop_assert_eq!(
                                    session.scores().total(),
                                    scores.total() + SCORE_INCREMENT
                                );
                            }
                        }
                        Command::Previous => {
                            session.previous();
                        }
                        Command::Next => {
                            session.next();
                        }
                        Command::GoTo(index) => {
                            session.go_to(*index);
                        }
                    }
                    if !matches!(cmd, Command::Select(_)) {
                        prop_assert_eq!(session.scores(), scores);
                        prop_assert_eq!(session.answered_flags(), &flags[..]);
                    }

                    prop_assert_eq!(
                        session.phase() == SessionPhase::Completed,
                        session.all_answered()
                    );
                    prop_assert!(session.current_index() < n);
                    prop_assert!(session.verify().is_ok());
                }

                let first_answers = session.answered_count() as u32;
                prop_assert_eq!(session.responses().len(), session.answered_count());
                prop_assert_eq!(session.scores().total(), first_answers * SCORE_INCREMENT);
            }

            #[test]
            fn scores_do_not_depend_on_answer_order(
                options in prop::collection::vec(0..OPTIONS, 1..8)
            ) {
                let n = options.len();

                let mut in_order = session_with(n);
                for (index, option) in options.iter().enumerate() {
                    in_order.go_to(index);
                    in_order.select_option(*option).unwrap();
                }

                let mut reversed = session_with(n);
                for (index, option) in options.iter().enumerate().rev() {
                    reversed.go_to(index);
                    reversed.previous();
                    reversed.next();
                    reversed.go_to(index);
                    reversed.select_option(*option).unwrap();
                }

                prop_assert_eq!(in_order.phase(), SessionPhase::Completed);
                prop_assert_eq!(reversed.phase(), SessionPhase::Completed);
                prop_assert_eq!(in_order.scores(), reversed.scores());
            }
        }
    }
}
