// * Application configuration
// * Defaults -> optional TOML file -> environment overrides

pub mod constants;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use constants::{
    DEFAULT_DATA_FILE, DEFAULT_OPENAI_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SCRAPE_INTERVAL_MS, DEFAULT_USER_AGENT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the JSON record file
    pub data_file: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Minimum spacing between two page fetches
    pub scrape_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Empty key disables summaries and AI insights
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            scrape_interval_ms: DEFAULT_SCRAPE_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from an optional TOML file, then applies environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Overrides fields from `RIVAL_*` and `OPENAI_API_KEY` environment variables
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("RIVAL_DATA_FILE") {
            self.data_file = PathBuf::from(v);
        }
        if let Some(v) = var("RIVAL_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("RIVAL_LOG_FORMAT") {
            self.log_format = match v.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(ConfigError::Invalid { key: "RIVAL_LOG_FORMAT", value: v }),
            };
        }
        if let Some(v) = var("RIVAL_SCRAPE_INTERVAL_MS") {
            self.scrape_interval_ms = v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "RIVAL_SCRAPE_INTERVAL_MS", value: v })?;
        }
        if let Some(v) = var("RIVAL_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "RIVAL_TIMEOUT_SECS", value: v })?;
        }
        if let Some(v) = var("RIVAL_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = var("RIVAL_OPENAI_MODEL") {
            self.openai_model = v;
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(v).filter(|k| !k.trim().is_empty());
        }
        Ok(self)
    }

    /// Returns the API key only when it is non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
