//! Analysis of a completed assessment.
//!
//! The analysis collaborator is asked first. Its payload is loosely typed
//! JSON, so it is validated at the boundary and mapped into an
//! [`AnalysisResult`]. Whenever the collaborator fails, or answers with
//! something unusable, a deterministic local analysis is produced instead so
//! the student always sees a result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::category::StemCategory;
use super::scoring::ScoreMap;
use super::session::AnalysisRequest;
use crate::collaborators::AnalysisCollaborator;
use crate::error::CollaboratorError;

const SERVICE: &str = "analysis";

/// Skills suggested by the local analysis, independent of the scores.
pub const GENERIC_SKILLS: [&str; 5] = [
    "Critical thinking",
    "Problem solving",
    "Communication",
    "Collaboration",
    "Continuous learning",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOrigin {
    Collaborator,
    LocalFallback,
}

/// Recommendation produced for one completed session. Immutable once made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub primary_field: StemCategory,
    pub secondary_field: Option<StemCategory>,
    pub explanation: String,
    pub skills: Vec<String>,
    pub environments: Vec<String>,
    pub scores: ScoreMap,
    pub origin: AnalysisOrigin,
}

/// Wire shape of the analysis collaborator's answer. Every field is
/// optional here; [`AnalysisPayload::validate`] decides what is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    #[serde(default, alias = "primaryCategory")]
    pub primary_field: Option<String>,
    #[serde(default, alias = "secondaryCategory")]
    pub secondary_field: Option<String>,
    #[serde(default, alias = "analysis")]
    pub explanation: Option<String>,
    #[serde(default, alias = "skillRecommendations")]
    pub skills: Option<Vec<String>>,
    #[serde(default, alias = "recommendedEnvironments")]
    pub environments: Option<Vec<String>>,
}

impl AnalysisPayload {
    /// Map the payload into an [`AnalysisResult`] carrying `scores`.
    ///
    /// # Errors
    /// Returns `CollaboratorError::Validation` when the primary field is
    /// missing or unknown, or the explanation is empty.
    pub fn validate(self, scores: ScoreMap) -> Result<AnalysisResult, CollaboratorError> {
        let primary_raw = self
            .primary_field
            .ok_or_else(|| CollaboratorError::validation(SERVICE, "missing primary field"))?;
        let primary_field = primary_raw
            .parse::<StemCategory>()
            .map_err(|e| CollaboratorError::validation(SERVICE, e.to_string()))?;

        // An unparsable secondary is dropped rather than failing the whole result.
        let secondary_field = self
            .secondary_field
            .and_then(|s| s.parse::<StemCategory>().ok())
            .filter(|s| *s != primary_field);

        let explanation = self
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| CollaboratorError::validation(SERVICE, "missing explanation"))?;

        let skills = self
            .skills
            .filter(|s| !s.is_empty())
            .unwrap_or_else(generic_skills);
        let environments = self
            .environments
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| environments_for(primary_field));

        Ok(AnalysisResult {
            primary_field,
            secondary_field,
            explanation,
            skills,
            environments,
            scores,
            origin: AnalysisOrigin::Collaborator,
        })
    }
}

fn generic_skills() -> Vec<String> {
    GENERIC_SKILLS.iter().map(|s| s.to_string()).collect()
}

/// Typical working environments for a field.
pub fn environments_for(category: StemCategory) -> Vec<String> {
    let envs: &[&str] = match category {
        StemCategory::Science => &[
            "Research laboratories",
            "Universities and institutes",
            "Healthcare and life-science organisations",
        ],
        StemCategory::Technology => &[
            "Software companies",
            "Start-ups",
            "IT departments",
        ],
        StemCategory::Engineering => &[
            "Design and manufacturing firms",
            "Construction and infrastructure projects",
            "Energy and automotive companies",
        ],
        StemCategory::Mathematics => &[
            "Finance and insurance",
            "Data analytics teams",
            "Academic research",
        ],
    };
    envs.iter().map(|s| s.to_string()).collect()
}

/// Deterministic analysis computed from the scores alone.
///
/// Primary is the highest score and secondary the next one; ties follow
/// enumeration order.
pub fn local_analysis(scores: ScoreMap) -> AnalysisResult {
    let ranked = scores.ranked();
    let (primary, primary_score) = ranked[0];
    let (secondary, secondary_score) = ranked[1];

    let explanation = match secondary_score {
        0 => format!(
            "Your answers lean most strongly towards {primary} ({primary_score} points). \
             Careers centred on {primary} are a good place to start exploring."
        ),
        sec_score => format!(
            "Your answers lean most strongly towards {primary} ({primary_score} points), \
             followed by {secondary} ({sec_score} points). Careers that combine {primary} \
             with {secondary} are a good place to start exploring."
        ),
    };

    AnalysisResult {
        primary_field: primary,
        secondary_field: Some(secondary),
        explanation,
        skills: generic_skills(),
        environments: environments_for(primary),
        scores,
        origin: AnalysisOrigin::LocalFallback,
    }
}

/// Result of asking for an analysis. `failure` is set when the local
/// fallback had to be used.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub failure: Option<CollaboratorError>,
}

impl AnalysisOutcome {
    /// Notice to show next to a fallback result.
    pub fn notice(&self) -> Option<String> {
        self.failure.as_ref().map(|e| e.user_message())
    }
}

/// Asks the analysis collaborator and falls back locally on any failure.
pub struct AnalysisRequester {
    collaborator: Arc<dyn AnalysisCollaborator>,
}

impl AnalysisRequester {
    pub fn new(collaborator: Arc<dyn AnalysisCollaborator>) -> Self {
        Self { collaborator }
    }

    pub async fn request(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let attempt = match self
            .collaborator
            .analyze(&request.session_id, &request.scores)
            .await
        {
            Ok(payload) => payload.validate(request.scores),
            Err(e) => Err(e),
        };

        match attempt {
            Ok(result) => {
                info!(
                    session_id = %request.session_id,
                    primary = %result.primary_field,
                    "analysis received"
                );
                AnalysisOutcome {
                    result,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(
                    session_id = %request.session_id,
                    error = %e,
                    "analysis unavailable, using local fallback"
                );
                AnalysisOutcome {
                    result: local_analysis(request.scores),
                    failure: Some(e),
                }
            }
        }
    }
}
