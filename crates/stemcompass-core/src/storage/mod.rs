mod config;
pub mod database;
pub mod repository;

pub use config::{
    AccountConfig, BackendConfig, Config, QuestionSourceKind, ScoringConfig, SessionConfig,
};
pub use database::Database;
pub use repository::{AssessmentRepository, MemoryRepository};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `STEMCOMPASS_DATA_DIR` wins when set. Otherwise `~/.config/stemcompass/`,
/// or `~/.config/stemcompass-dev/` with `STEMCOMPASS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STEMCOMPASS_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STEMCOMPASS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("stemcompass-dev")
            } else {
                base_dir.join("stemcompass")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
