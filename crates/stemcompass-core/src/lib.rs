//! # STEM Compass Core Library
//!
//! This library provides the assessment logic behind the STEM Compass
//! mentorship product: students answer a short multiple-choice assessment
//! and receive a primary and secondary STEM field recommendation. The CLI
//! binary and any GUI are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Assessment session**: an explicit state machine driven by discrete
//!   events (questions loaded, option selected, analysis received, reset)
//! - **Scoring**: per-category counters, incremented once per first answer
//! - **Analysis**: the backend's analysis, validated at the boundary, with a
//!   deterministic local fallback
//! - **Collaborators**: traits for the question source, response recorder,
//!   analysis service and account service, with an HTTP implementation
//! - **Storage**: SQLite result history and TOML configuration
//!
//! ## Key Components
//!
//! - [`AssessmentSession`]: Core session state machine
//! - [`AssessmentFlow`]: Async orchestration around a session
//! - [`Database`]: Local assessment history
//! - [`Config`]: Application configuration management

pub mod assessment;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod storage;

pub use assessment::{
    AnalysisResult, AssessmentFlow, AssessmentRecord, AssessmentSession, FlowCollaborators,
    ScoreMap, SessionPhase, StemCategory, SCORE_INCREMENT,
};
pub use error::{CollaboratorError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use storage::{AssessmentRepository, Config, Database};
