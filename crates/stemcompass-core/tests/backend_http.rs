//! HTTP binding tests.
//!
//! Each test stands up a mockito server and drives `BackendClient` through
//! one collaborator trait.

use chrono::Utc;
use mockito::Matcher;
use serde_json::json;
use stemcompass_core::assessment::{
    local_analysis, AssessmentRecord, QuestionOrigin, ScoreMap, StemCategory, UserIdentity,
};
use stemcompass_core::collaborators::{
    AccountCollaborator, AnalysisCollaborator, BackendClient, QuestionSource, ResponseRecorder,
};
use stemcompass_core::storage::BackendConfig;
use stemcompass_core::CollaboratorError;

fn client(server: &mockito::ServerGuard) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: server.url(),
        api_token: Some("secret".into()),
        timeout_secs: 5,
    })
    .unwrap()
}

fn question_json(cats: [&str; 4]) -> serde_json::Value {
    json!({
        "question": "Which activity do you prefer?",
        "options": ["One", "Two", "Three", "Four"],
        "categories": cats,
    })
}

#[tokio::test]
async fn fetch_questions_maps_generated_set() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/assessment/generate")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "sessionId": "gen-1",
                "questions": [
                    question_json(["Science", "Technology", "Engineering", "Mathematics"]),
                    question_json(["Mathematics", "Engineering", "Technology", "Science"]),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let set = client(&server).fetch_questions().await.unwrap();
    mock.assert_async().await;
    assert_eq!(set.session_id, "gen-1");
    assert_eq!(set.origin, QuestionOrigin::Generated);
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.get(1).unwrap().category_for(0).unwrap(),
        StemCategory::Mathematics
    );
}

#[tokio::test]
async fn fetch_questions_reports_quota_on_429() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/assessment/generate")
        .with_status(429)
        .with_body(r#"{"error":"Too many requests"}"#)
        .create_async()
        .await;

    let err = client(&server).fetch_questions().await.unwrap_err();
    assert!(err.is_quota());
    assert!(err.user_message().to_lowercase().contains("quota"));
}

#[tokio::test]
async fn fetch_questions_reports_quota_from_error_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/assessment/generate")
        .with_status(500)
        .with_body(r#"{"error":"Gemini API quota exceeded"}"#)
        .create_async()
        .await;

    let err = client(&server).fetch_questions().await.unwrap_err();
    assert!(err.is_quota());
}

#[tokio::test]
async fn fetch_questions_generic_failure_is_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/assessment/generate")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let err = client(&server).fetch_questions().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Transient { .. }));
}

#[tokio::test]
async fn fetch_questions_rejects_malformed_question() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/assessment/generate")
        .with_status(200)
        .with_body(
            json!({
                "sessionId": "gen-2",
                "questions": [{"question": "Q", "options": ["a", "b", "c"], "categories": ["S", "T", "E"]}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server).fetch_questions().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Validation { .. }));
}

#[tokio::test]
async fn record_response_posts_indices() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/assessment/response")
        .match_body(Matcher::PartialJson(json!({
            "sessionId": "gen-1",
            "questionIndex": 2,
            "optionIndex": 3,
        })))
        .with_status(204)
        .create_async()
        .await;

    client(&server)
        .record_response("gen-1", 2, 3)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn analyze_sends_scores_and_parses_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/assessment/analyze")
        .match_body(Matcher::PartialJson(json!({
            "sessionId": "gen-1",
            "scores": {"Science": 20, "Technology": 10, "Engineering": 0, "Mathematics": 10},
        })))
        .with_status(200)
        .with_body(
            json!({
                "primaryField": "Science",
                "secondaryField": "Mathematics",
                "explanation": "You love experiments.",
                "skills": ["Lab work"],
                "environments": ["Research labs"]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let scores = ScoreMap {
        science: 20,
        technology: 10,
        engineering: 0,
        mathematics: 10,
    };
    let payload = client(&server).analyze("gen-1", &scores).await.unwrap();
    mock.assert_async().await;
    let result = payload.validate(scores).unwrap();
    assert_eq!(result.primary_field, StemCategory::Science);
    assert_eq!(result.secondary_field, Some(StemCategory::Mathematics));
    assert_eq!(result.skills, vec!["Lab work".to_string()]);
    assert_eq!(result.scores, scores);
}

#[tokio::test]
async fn analyze_unparsable_body_is_validation_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/assessment/analyze")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let err = client(&server)
        .analyze("gen-1", &ScoreMap::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CollaboratorError::Validation { .. }));
}

#[tokio::test]
async fn save_assessment_posts_to_user_path() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/users/student-1/assessments")
        .match_body(Matcher::PartialJson(json!({
            "sessionId": "gen-1",
            "primaryCategory": "Engineering",
        })))
        .with_status(201)
        .create_async()
        .await;

    let user = UserIdentity::new("student-1");
    let scores = ScoreMap::default().with_increment(StemCategory::Engineering, 10);
    let record = AssessmentRecord::new("gen-1", Some(&user), local_analysis(scores), Utc::now());
    client(&server)
        .save_assessment(&user.user_id, &record)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_backend_is_transient() {
    let backend = BackendClient::new(&BackendConfig {
        base_url: "http://127.0.0.1:9".into(),
        api_token: None,
        timeout_secs: 2,
    })
    .unwrap();
    let err = backend.fetch_questions().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Transient { .. }));
}
