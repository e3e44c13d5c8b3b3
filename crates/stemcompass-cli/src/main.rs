use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stemcompass-cli", version, about = "STEM Compass CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the STEM interest assessment
    Assessment {
        #[command(subcommand)]
        action: commands::assessment::AssessmentAction,
    },
    /// Browse completed assessments stored on this device
    Results {
        #[command(subcommand)]
        action: commands::results::ResultsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("STEMCOMPASS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Assessment { action } => commands::assessment::run(action),
        Commands::Results { action } => commands::results::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
