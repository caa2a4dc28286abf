use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;

pub const DEFAULT_QUOTE_API_URL: &str = "https://api.api-ninjas.com/v1/quotes/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub quote_api_url: String,
    /// Without a key the quote service is skipped and fallback texts are used.
    pub quote_api_key: Option<String>,
    pub quote_timeout_ms: u64,
    pub username_check_delay_ms: u64,
    pub database_path: Option<PathBuf>,
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            quote_api_key: None,
            quote_timeout_ms: 5000,
            username_check_delay_ms: 500,
            database_path: None,
            offline: false,
        }
    }
}

impl Config {
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    pub fn username_check_delay(&self) -> Duration {
        Duration::from_millis(self.username_check_delay_ms)
    }

    /// Key to use for the quote service, if it should be contacted at all.
    pub fn quote_api_key(&self) -> Option<&str> {
        if self.offline {
            return None;
        }
        self.quote_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("chimptype_accounts.db"))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_dir()
            .map(|dir| dir.join("config.json"))
            .unwrap_or_else(|| PathBuf::from("chimptype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
