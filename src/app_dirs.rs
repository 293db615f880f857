use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keypace";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/keypace`, falling back to the platform data dir.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn best_score_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("best.json"))
            .unwrap_or_else(|| PathBuf::from("keypace_best.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("keypace.log"))
            .unwrap_or_else(|| PathBuf::from("keypace.log"))
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("keypace_config.json")
        }
    }
}
