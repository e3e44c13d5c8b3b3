use std::time::Duration;

use clap::Subcommand;
use serde_json::json;
use stemcompass_core::assessment::{
    AssessmentFlow, AssessmentSession, FlowCollaborators, SessionPhase,
};
use stemcompass_core::storage::Database;
use stemcompass_core::{Config, Event};
use tracing::warn;

const SESSION_KEY: &str = "assessment_session";

#[derive(Subcommand)]
pub enum AssessmentAction {
    /// Fetch questions and begin (or resume) an assessment
    Start,
    /// Print the session state and the current question as JSON
    Status,
    /// Answer the current question
    Answer {
        /// Option number, 1-4
        #[arg(value_parser = clap::value_parser!(u8).range(1..=4))]
        option: u8,
    },
    /// Go back one question
    Prev,
    /// Go forward one question
    Next,
    /// Jump to a question
    Goto {
        /// Question number, starting at 1
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        question: u16,
    },
    /// Discard the current session and start over with new questions
    Retake,
    /// Print the analysis of the completed session
    Result,
}

/// Restore the stored session, starting over if it is missing or unusable.
fn load_session(db: &Database, config: &Config) -> AssessmentSession {
    if let Ok(Some(json)) = db.kv_get(SESSION_KEY) {
        match serde_json::from_str::<AssessmentSession>(&json) {
            Ok(session) => match session.verify() {
                Ok(()) => return session,
                Err(e) => warn!(error = %e, "discarding stored assessment session"),
            },
            Err(e) => warn!(error = %e, "stored assessment session is unreadable"),
        }
    }
    AssessmentSession::new(config.scoring.increment)
}

fn save_session(
    db: &Database,
    session: &AssessmentSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

/// Snapshot plus whatever the student needs to see next.
fn view(session: &AssessmentSession) -> serde_json::Value {
    let question = session.current_question().map(|q| {
        json!({
            "number": q.index + 1,
            "text": q.text,
            "options": q.options(),
            "answered": session.is_answered(q.index),
        })
    });
    json!({
        "snapshot": session.snapshot(),
        "question": question,
        "load_failure": session.load_failure(),
        "analysis": session.analysis(),
    })
}

fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

pub fn run(action: AssessmentAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let session = load_session(&db, &config);

    let collaborators = FlowCollaborators::from_config(&config)?;
    let mut flow = AssessmentFlow::new(session, collaborators, Box::new(Database::open()?))
        .with_identity(config.identity())
        .with_advance_delay(Duration::from_millis(config.session.advance_delay_ms));

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        match action {
            AssessmentAction::Start => {
                match flow.session().phase() {
                    SessionPhase::Loading | SessionPhase::LoadFailed => {
                        print_events(&flow.load().await.into_iter().collect::<Vec<_>>())?;
                    }
                    SessionPhase::Completed => {
                        print_events(&flow.retake().await)?;
                    }
                    SessionPhase::InProgress => {}
                }
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Status => {
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Answer { option } => {
                if flow.session().phase() != SessionPhase::InProgress {
                    return Err("no assessment in progress; run `assessment start`".into());
                }
                let outcome = flow.answer(usize::from(option) - 1).await?;
                if outcome.events.is_empty() {
                    return Err("question already answered; use `next` or `goto`".into());
                }
                print_events(&outcome.events)?;
                if let Some(report) = &outcome.completion {
                    println!("{}", serde_json::to_string_pretty(report)?);
                } else {
                    println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
                }
            }
            AssessmentAction::Prev => {
                print_events(&flow.previous().into_iter().collect::<Vec<_>>())?;
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Next => {
                print_events(&flow.next().into_iter().collect::<Vec<_>>())?;
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Goto { question } => {
                let index = usize::from(question) - 1;
                if index >= flow.session().question_count() {
                    return Err(format!(
                        "question {question} does not exist ({} questions)",
                        flow.session().question_count()
                    )
                    .into());
                }
                print_events(&flow.go_to(index).into_iter().collect::<Vec<_>>())?;
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Retake => {
                print_events(&flow.retake().await)?;
                println!("{}", serde_json::to_string_pretty(&view(flow.session()))?);
            }
            AssessmentAction::Result => match flow.session().analysis() {
                Some(analysis) => println!("{}", serde_json::to_string_pretty(analysis)?),
                None => return Err("assessment not completed yet".into()),
            },
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    });

    save_session(&db, flow.session())?;
    result
}
