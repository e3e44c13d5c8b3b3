use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::StemCategory;
use crate::error::ValidationError;

/// Every question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A multiple-choice question whose options each map to one STEM category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub index: usize,
    pub text: String,
    options: [String; OPTIONS_PER_QUESTION],
    categories: [StemCategory; OPTIONS_PER_QUESTION],
}

impl Question {
    /// Build a question, rejecting anything other than four options with
    /// four parallel categories.
    pub fn new(
        index: usize,
        text: impl Into<String>,
        options: Vec<String>,
        categories: Vec<StemCategory>,
    ) -> Result<Self, ValidationError> {
        let malformed = ValidationError::MalformedQuestion {
            index,
            options: options.len(),
            categories: categories.len(),
        };
        let options: [String; OPTIONS_PER_QUESTION] =
            options.try_into().map_err(|_| malformed.clone())?;
        let categories: [StemCategory; OPTIONS_PER_QUESTION] =
            categories.try_into().map_err(|_| malformed)?;
        Ok(Self {
            index,
            text: text.into(),
            options,
            categories,
        })
    }

    pub fn from_arrays(
        index: usize,
        text: impl Into<String>,
        options: [String; OPTIONS_PER_QUESTION],
        categories: [StemCategory; OPTIONS_PER_QUESTION],
    ) -> Self {
        Self {
            index,
            text: text.into(),
            options,
            categories,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn categories(&self) -> &[StemCategory] {
        &self.categories
    }

    /// Category scored when `option` is picked.
    pub fn category_for(&self, option: usize) -> Result<StemCategory, ValidationError> {
        self.categories
            .get(option)
            .copied()
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: format!("question {} options", self.index),
                index: option,
                len: OPTIONS_PER_QUESTION,
            })
    }
}

/// Where a question set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOrigin {
    /// Produced by the generative backend.
    Generated,
    /// The bundled question bank.
    Static,
}

/// An ordered, non-empty question set bound to one backend session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredQuestionSet")]
pub struct QuestionSet {
    pub session_id: String,
    pub origin: QuestionOrigin,
    questions: Vec<Question>,
}

/// Deserialization goes through `QuestionSet::new` so a stored set can
/// never come back empty.
#[derive(Deserialize)]
struct StoredQuestionSet {
    session_id: String,
    origin: QuestionOrigin,
    questions: Vec<Question>,
}

impl TryFrom<StoredQuestionSet> for QuestionSet {
    type Error = ValidationError;

    fn try_from(stored: StoredQuestionSet) -> Result<Self, Self::Error> {
        QuestionSet::new(stored.session_id, stored.origin, stored.questions)
    }
}

impl QuestionSet {
    pub fn new(
        session_id: impl Into<String>,
        origin: QuestionOrigin,
        questions: Vec<Question>,
    ) -> Result<Self, ValidationError> {
        if questions.is_empty() {
            return Err(ValidationError::EmptyCollection("question set".into()));
        }
        Ok(Self {
            session_id: session_id.into(),
            origin,
            questions,
        })
    }

    /// Build a set the caller already knows to be non-empty.
    pub(crate) fn from_parts(
        session_id: impl Into<String>,
        origin: QuestionOrigin,
        questions: Vec<Question>,
    ) -> Self {
        debug_assert!(!questions.is_empty());
        Self {
            session_id: session_id.into(),
            origin,
            questions,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// One authoritative answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub question_index: usize,
    pub option_index: usize,
    pub category: StemCategory,
    pub answered_at: DateTime<Utc>,
}
