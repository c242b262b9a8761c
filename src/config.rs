//! Configuration management for ibot
//!
//! Settings are loaded from a YAML file, then overridden by `IBOT_*`
//! environment variables, then by command-line flags. Every field has a
//! default so a missing or partial file still yields a usable config.

use crate::error::{IbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend API endpoints and timeouts
    #[serde(default)]
    pub api: ApiConfig,

    /// Streaming chat behavior
    #[serde(default)]
    pub chat: ChatConfig,

    /// Carbon data generation defaults
    #[serde(default)]
    pub carbon: CarbonConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the RAG backend (knowledge bases, documents, chat)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the carbon data service; falls back to `base_url`
    #[serde(default)]
    pub carbon_base_url: Option<String>,

    /// Total request timeout for non-streaming calls, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TCP connect timeout, in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Delay between document parse status polls, in seconds
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Give up waiting for a document parse after this many seconds
    #[serde(default = "default_poll_deadline_seconds")]
    pub poll_deadline_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:18080/b/ibot/".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_poll_interval_seconds() -> u64 {
    2
}

fn default_poll_deadline_seconds() -> u64 {
    600
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            carbon_base_url: None,
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
            poll_deadline_seconds: default_poll_deadline_seconds(),
        }
    }
}

impl ApiConfig {
    /// Parses the RAG base URL, normalized so that joining a relative
    /// path appends to it instead of replacing the final segment.
    pub fn base_url(&self) -> Result<Url> {
        parse_base_url(&self.base_url)
    }

    /// Parses the carbon service base URL, falling back to the RAG base
    /// URL when no dedicated endpoint is configured.
    pub fn carbon_base_url(&self) -> Result<Url> {
        match &self.carbon_base_url {
            Some(raw) => parse_base_url(raw),
            None => self.base_url(),
        }
    }
}

/// Parse a configured base URL and ensure its path ends with a slash.
///
/// `Url::join` drops the last path segment when the base does not end
/// with `/`, which would silently truncate `/b/ibot` to `/b/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| IbotError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(IbotError::Config(format!("Invalid base URL '{}': cannot be a base", raw)).into());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Streaming chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Knowledge base to query when no `--kb` flag is given
    #[serde(default)]
    pub knowledge_base_id: Option<i64>,

    /// Number of document chunks retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Minimum delay between displayed answer fragments, in milliseconds
    #[serde(default = "default_pacing_interval_ms")]
    pub pacing_interval_ms: u64,

    /// Abort a stream when the server sends nothing for this long, in seconds
    #[serde(default = "default_stream_idle_timeout_seconds")]
    pub stream_idle_timeout_seconds: u64,
}

fn default_top_k() -> u32 {
    5
}

fn default_pacing_interval_ms() -> u64 {
    500
}

fn default_stream_idle_timeout_seconds() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            knowledge_base_id: None,
            top_k: default_top_k(),
            pacing_interval_ms: default_pacing_interval_ms(),
            stream_idle_timeout_seconds: default_stream_idle_timeout_seconds(),
        }
    }
}

/// Defaults for generated carbon datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonConfig {
    /// Reporting year used by `carbon generate` when none is given
    #[serde(default = "default_carbon_year")]
    pub default_year: i32,

    /// Latitude of the satellite observation cluster center
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,

    /// Longitude of the satellite observation cluster center
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,

    /// Number of satellite observations to generate
    #[serde(default = "default_satellite_count")]
    pub satellite_count: usize,

    /// Account attached to carbon imports, when the backend requires one
    #[serde(default)]
    pub user_id: Option<i64>,
}

fn default_carbon_year() -> i32 {
    2024
}

fn default_center_latitude() -> f64 {
    39.9
}

fn default_center_longitude() -> f64 {
    116.4
}

fn default_satellite_count() -> usize {
    800
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            default_year: default_carbon_year(),
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            satellite_count: default_satellite_count(),
            user_id: None,
        }
    }
}

impl Config {
    /// Load configuration from a file with environment variable and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command-line arguments
    ///
    /// # Returns
    ///
    /// Returns the merged configuration, or an error if the file exists
    /// but cannot be read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IbotError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| IbotError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            chat: ChatConfig::default(),
            carbon: CarbonConfig::default(),
        }
    }

    /// Apply `IBOT_*` environment variable overrides
    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("IBOT_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(carbon_url) = std::env::var("IBOT_CARBON_BASE_URL") {
            self.api.carbon_base_url = Some(carbon_url);
        }

        if let Ok(timeout) = std::env::var("IBOT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(value) => self.api.timeout_seconds = value,
                Err(_) => {
                    tracing::warn!("Invalid IBOT_TIMEOUT_SECONDS value: {}, ignoring", timeout)
                }
            }
        }

        if let Ok(kb) = std::env::var("IBOT_KNOWLEDGE_BASE") {
            match kb.parse::<i64>() {
                Ok(value) => self.chat.knowledge_base_id = Some(value),
                Err(_) => {
                    tracing::warn!("Invalid IBOT_KNOWLEDGE_BASE value: {}, ignoring", kb)
                }
            }
        }

        if let Ok(top_k) = std::env::var("IBOT_TOP_K") {
            match top_k.parse::<u32>() {
                Ok(value) => self.chat.top_k = value,
                Err(_) => tracing::warn!("Invalid IBOT_TOP_K value: {}, ignoring", top_k),
            }
        }

        if let Ok(pacing) = std::env::var("IBOT_PACING_MS") {
            match pacing.parse::<u64>() {
                Ok(value) => self.chat.pacing_interval_ms = value,
                Err(_) => tracing::warn!("Invalid IBOT_PACING_MS value: {}, ignoring", pacing),
            }
        }

        if let Ok(idle) = std::env::var("IBOT_STREAM_IDLE_TIMEOUT") {
            match idle.parse::<u64>() {
                Ok(value) => self.chat.stream_idle_timeout_seconds = value,
                Err(_) => {
                    tracing::warn!("Invalid IBOT_STREAM_IDLE_TIMEOUT value: {}, ignoring", idle)
                }
            }
        }

        if let Ok(user) = std::env::var("IBOT_USER_ID") {
            match user.parse::<i64>() {
                Ok(value) => self.carbon.user_id = Some(value),
                Err(_) => tracing::warn!("Invalid IBOT_USER_ID value: {}, ignoring", user),
            }
        }
    }

    /// Apply command-line flag overrides
    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }

        match &cli.command {
            crate::cli::Commands::Chat {
                knowledge_base,
                top_k,
            } => {
                if let Some(id) = knowledge_base {
                    self.chat.knowledge_base_id = Some(*id);
                }
                if let Some(k) = top_k {
                    self.chat.top_k = *k;
                }
            }
            crate::cli::Commands::Ask {
                knowledge_base,
                top_k,
                ..
            } => {
                if let Some(id) = knowledge_base {
                    self.chat.knowledge_base_id = Some(*id);
                }
                if let Some(k) = top_k {
                    self.chat.top_k = *k;
                }
            }
            _ => {}
        }
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// Returns an error describing the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        self.api.base_url()?;
        self.api.carbon_base_url()?;

        if self.api.timeout_seconds == 0 {
            return Err(
                IbotError::Config("api.timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.api.connect_timeout_seconds == 0 {
            return Err(IbotError::Config(
                "api.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.poll_interval_seconds == 0 {
            return Err(IbotError::Config(
                "api.poll_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.poll_deadline_seconds < self.api.poll_interval_seconds {
            return Err(IbotError::Config(
                "api.poll_deadline_seconds must be at least api.poll_interval_seconds".to_string(),
            )
            .into());
        }

        if let Some(id) = self.chat.knowledge_base_id {
            if id <= 0 {
                return Err(IbotError::Config(
                    "chat.knowledge_base_id must be a positive identifier".to_string(),
                )
                .into());
            }
        }

        if self.chat.top_k == 0 || self.chat.top_k > 50 {
            return Err(
                IbotError::Config("chat.top_k must be between 1 and 50".to_string()).into(),
            );
        }

        if self.chat.pacing_interval_ms == 0 {
            return Err(IbotError::Config(
                "chat.pacing_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.pacing_interval_ms > 10_000 {
            return Err(IbotError::Config(
                "chat.pacing_interval_ms must be at most 10000".to_string(),
            )
            .into());
        }

        if self.chat.stream_idle_timeout_seconds == 0 {
            return Err(IbotError::Config(
                "chat.stream_idle_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.carbon.default_year < 2000 || self.carbon.default_year > 2100 {
            return Err(IbotError::Config(
                "carbon.default_year must be between 2000 and 2100".to_string(),
            )
            .into());
        }

        if self.carbon.satellite_count == 0 {
            return Err(IbotError::Config(
                "carbon.satellite_count must be greater than 0".to_string(),
            )
            .into());
        }

        if self.carbon.center_latitude.abs() > 90.0 {
            return Err(IbotError::Config(
                "carbon.center_latitude must be between -90 and 90".to_string(),
            )
            .into());
        }

        if self.carbon.center_longitude.abs() > 180.0 {
            return Err(IbotError::Config(
                "carbon.center_longitude must be between -180 and 180".to_string(),
            )
            .into());
        }

        if let Some(user_id) = self.carbon.user_id {
            if user_id <= 0 {
                return Err(IbotError::Config(
                    "carbon.user_id must be a positive identifier".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
