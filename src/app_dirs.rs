use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "studytimer";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory holding the stored history and language files
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }

    pub fn log_dir(state_dir: &std::path::Path) -> PathBuf {
        state_dir.join("logs")
    }
}
