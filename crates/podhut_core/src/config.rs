//! Configuration management

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://podcast-api.netlify.app";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Where the file backend keeps its tables. Falls back to [`default_data_dir`].
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_shows_ttl")]
    pub shows_ttl_secs: u64,
    #[serde(default = "default_show_ttl")]
    pub show_ttl_secs: u64,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
    #[serde(default = "default_skip")]
    pub skip_seconds: f64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_threshold")]
    pub search_threshold: f64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_shows_ttl() -> u64 {
    5 * 60
}

fn default_show_ttl() -> u64 {
    10 * 60
}

fn default_progress_interval() -> u64 {
    10
}

fn default_skip() -> f64 {
    15.0
}

fn default_page_size() -> usize {
    15
}

fn default_threshold() -> f64 {
    0.4
}

fn default_http_timeout() -> u64 {
    30
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            data_dir: None,
            shows_ttl_secs: default_shows_ttl(),
            show_ttl_secs: default_show_ttl(),
            progress_interval_secs: default_progress_interval(),
            skip_seconds: default_skip(),
            page_size: default_page_size(),
            search_threshold: default_threshold(),
            http_timeout_secs: default_http_timeout(),
            log_filter: default_log_filter(),
        }
    }
}

pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("podhut")
}

pub fn default_config_path() -> PathBuf {
    config_root().join("config.json")
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("podhut")
}

impl Config {
    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&default_config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn shows_ttl(&self) -> Duration {
        Duration::from_secs(self.shows_ttl_secs)
    }

    pub fn show_ttl(&self) -> Duration {
        Duration::from_secs(self.show_ttl_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
