use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory for mutable state: the results database, CSV log and traces.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("quizring"),
            )
        } else {
            ProjectDirs::from("", "", "quizring").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("results.db"))
    }

    pub fn csv_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("sessions.csv"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("logs"))
    }
}
