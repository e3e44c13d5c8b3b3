//! Forwarding finished assessments to the student's account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::analysis::AnalysisResult;
use super::category::StemCategory;
use super::scoring::ScoreMap;
use crate::collaborators::AccountCollaborator;

/// A signed-in student. Without one nothing is sent to the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// The unit stored locally and forwarded to the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub scores: ScoreMap,
    pub primary_category: StemCategory,
    pub analysis: AnalysisResult,
    pub completed_at: DateTime<Utc>,
}

impl AssessmentRecord {
    pub fn new(
        session_id: impl Into<String>,
        user: Option<&UserIdentity>,
        analysis: AnalysisResult,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user.map(|u| u.user_id.clone()),
            scores: analysis.scores,
            primary_category: analysis.primary_field,
            analysis,
            completed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistOutcome {
    /// No user identity; nothing forwarded.
    Skipped,
    Saved,
    /// The account service failed. Results are still shown.
    Failed { warning: String },
}

pub struct PersistenceBridge {
    account: Arc<dyn AccountCollaborator>,
}

impl PersistenceBridge {
    pub fn new(account: Arc<dyn AccountCollaborator>) -> Self {
        Self { account }
    }

    pub async fn persist(
        &self,
        user: Option<&UserIdentity>,
        record: &AssessmentRecord,
    ) -> PersistOutcome {
        let Some(user) = user else {
            return PersistOutcome::Skipped;
        };
        match self.account.save_assessment(&user.user_id, record).await {
            Ok(()) => {
                info!(
                    session_id = %record.session_id,
                    user_id = %user.user_id,
                    "assessment saved to account"
                );
                PersistOutcome::Saved
            }
            Err(e) => {
                warn!(
                    session_id = %record.session_id,
                    error = %e,
                    "failed to save assessment to account"
                );
                PersistOutcome::Failed {
                    warning: format!("Your result could not be saved to your account: {e}"),
                }
            }
        }
    }
}
