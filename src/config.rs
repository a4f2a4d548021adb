use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where history and language are stored; platform state dir when unset
    pub state_dir: Option<PathBuf>,
    /// tracing filter level, e.g. `debug`
    pub log_level: Option<String>,
    /// Ask before deleting all history
    pub confirm_clear: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: None,
            log_level: None,
            confirm_clear: true,
        }
    }
}

impl Config {
    pub fn resolved_state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .or_else(AppDirs::state_dir)
            .unwrap_or_else(|| PathBuf::from("studytimer_state"))
    }
}

/// Where user settings come from. File backed in the binary.
pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

/// Pretty JSON config in the platform config dir
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("studytimer_config.json"));
        Self::with_path(path)
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the defaults on first run so there is a file to edit.
    /// Returns whether a file was created.
    pub fn init_if_missing(&self) -> std::io::Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or malformed files give the defaults
    fn load(&self) -> Config {
        fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Config>(&bytes).ok())
            .unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
