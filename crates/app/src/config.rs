use anyhow::Context;
use hisab_core::Calendar;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use hisab_storage::RECENT_LIMIT;

pub const DATA_DIR_ENV: &str = "HISAB_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where transactions are stored. Falls back to the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Calendar used when listing transactions.
    pub display_calendar: Calendar,
    /// Number of transactions `recent` shows.
    pub recent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            display_calendar: Calendar::Bs,
            recent_limit: RECENT_LIMIT,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "hisab", "Hisab")
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads `path` if given (it must exist), otherwise the platform config
    /// file if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Precedence: command-line flag, `HISAB_DATA_DIR`, config file, platform
    /// data dir.
    pub fn resolve_data_dir(&self, flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        let env = std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        flag.or(env)
            .or_else(|| self.data_dir.clone())
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .context("Could not determine a data directory; pass --data-dir")
    }
}
