use clap::Subcommand;
use stemcompass_core::storage::{AssessmentRepository, Database};

#[derive(Subcommand)]
pub enum ResultsAction {
    /// List completed assessments, newest first
    List,
    /// Show one completed assessment
    Show {
        /// Session id of the assessment
        session_id: String,
    },
}

pub fn run(action: ResultsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ResultsAction::List => {
            let records = db.list()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        ResultsAction::Show { session_id } => match db.find_by_id(&session_id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => return Err(format!("no assessment with session id {session_id}").into()),
        },
    }
    Ok(())
}
