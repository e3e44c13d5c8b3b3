//! HTTP binding of the collaborators against the mentorship backend.
//!
//! One [`BackendClient`] implements all four collaborator traits. Payloads
//! are validated here and mapped into the typed assessment model; anything
//! that does not fit is reported as `CollaboratorError::Validation`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::traits::{AccountCollaborator, AnalysisCollaborator, QuestionSource, ResponseRecorder};
use crate::assessment::{
    AnalysisPayload, AssessmentRecord, Question, QuestionOrigin, QuestionSet, ScoreMap,
    StemCategory,
};
use crate::error::CollaboratorError;
use crate::storage::BackendConfig;

const QUESTION_SERVICE: &str = "question-source";
const RECORDER_SERVICE: &str = "response-recorder";
const ANALYSIS_SERVICE: &str = "analysis";
const ACCOUNT_SERVICE: &str = "account";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestions {
    #[serde(default, alias = "session_id")]
    session_id: Option<String>,
    #[serde(default)]
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    #[serde(alias = "text")]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
}

/// Client for the mentorship backend's assessment and account endpoints.
pub struct BackendClient {
    base_url: Url,
    api_token: Option<String>,
    http_client: Client,
}

impl BackendClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns a transient error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, CollaboratorError> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| CollaboratorError::Transient {
                service: "backend".into(),
                message: format!("invalid base url '{}'", config.base_url),
                source: Some(Box::new(e)),
            })?;
        // Relative joins must keep any path prefix of the base.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| transport_error("backend", e))?;
        Ok(Self {
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            http_client,
        })
    }

    fn endpoint(&self, service: &str, path: &str) -> Result<Url, CollaboratorError> {
        self.base_url.join(path).map_err(|e| CollaboratorError::Transient {
            service: service.to_string(),
            message: format!("invalid endpoint path '{path}'"),
            source: Some(Box::new(e)),
        })
    }

    async fn post(
        &self,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, CollaboratorError> {
        let url = self.endpoint(service, path)?;
        debug!(%url, service, "POST");
        let mut request = self.http_client.post(url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| transport_error(service, e))?;
        check_status(service, resp).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, CollaboratorError> {
        let resp = self.post(service, path, body).await?;
        let text = resp
            .text()
            .await
            .map_err(|e| transport_error(service, e))?;
        serde_json::from_str(&text)
            .map_err(|e| CollaboratorError::validation(service, format!("unparsable body: {e}")))
    }
}

fn transport_error(service: &str, err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transient {
        service: service.to_string(),
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

/// Map non-success responses onto the error taxonomy. HTTP 429 or an error
/// body mentioning "quota" means the AI quota is exhausted.
async fn check_status(
    service: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, CollaboratorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = error_detail(&body);
    if status == StatusCode::TOO_MANY_REQUESTS || detail.to_lowercase().contains("quota") {
        return Err(CollaboratorError::quota(service, detail));
    }
    Err(CollaboratorError::transient(
        service,
        format!("HTTP {status}: {detail}"),
    ))
}

/// Pull `error` or `message` out of a JSON error body, else the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn map_questions(generated: GeneratedQuestions) -> Result<QuestionSet, CollaboratorError> {
    let session_id = generated
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CollaboratorError::validation(QUESTION_SERVICE, "missing sessionId"))?;

    let mut questions = Vec::with_capacity(generated.questions.len());
    for (index, wire) in generated.questions.into_iter().enumerate() {
        let categories = wire
            .categories
            .iter()
            .map(|c| c.parse::<StemCategory>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CollaboratorError::validation(QUESTION_SERVICE, e.to_string()))?;
        let question = Question::new(index, wire.question, wire.options, categories)
            .map_err(|e| CollaboratorError::validation(QUESTION_SERVICE, e.to_string()))?;
        questions.push(question);
    }

    QuestionSet::new(session_id, QuestionOrigin::Generated, questions)
        .map_err(|e| CollaboratorError::validation(QUESTION_SERVICE, e.to_string()))
}

#[async_trait]
impl QuestionSource for BackendClient {
    fn name(&self) -> &str {
        "backend"
    }

    async fn fetch_questions(&self) -> Result<QuestionSet, CollaboratorError> {
        let generated: GeneratedQuestions = self
            .post_json(QUESTION_SERVICE, "api/assessment/generate", &json!({}))
            .await?;
        map_questions(generated)
    }
}

#[async_trait]
impl ResponseRecorder for BackendClient {
    async fn record_response(
        &self,
        session_id: &str,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), CollaboratorError> {
        let body = json!({
            "sessionId": session_id,
            "questionIndex": question_index,
            "optionIndex": option_index,
        });
        self.post(RECORDER_SERVICE, "api/assessment/response", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisCollaborator for BackendClient {
    async fn analyze(
        &self,
        session_id: &str,
        scores: &ScoreMap,
    ) -> Result<AnalysisPayload, CollaboratorError> {
        let body = json!({
            "sessionId": session_id,
            "scores": scores,
        });
        self.post_json(ANALYSIS_SERVICE, "api/assessment/analyze", &body).await
    }
}

#[async_trait]
impl AccountCollaborator for BackendClient {
    async fn save_assessment(
        &self,
        user_id: &str,
        record: &AssessmentRecord,
    ) -> Result<(), CollaboratorError> {
        let path = format!(
            "api/users/{}/assessments",
            urlencoding::encode(user_id)
        );
        let body = serde_json::to_value(record)
            .map_err(|e| CollaboratorError::validation(ACCOUNT_SERVICE, e.to_string()))?;
        self.post(ACCOUNT_SERVICE, &path, &body).await?;
        Ok(())
    }
}
