//! Configuration management for Chatlift
//!
//! Loads settings from TOML file at ~/.chatlift/config.toml

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// CLI output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent presented to share pages. Some providers 403 obvious
    /// bots, so the default is a current browser string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept-Language header value
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            accept_language: default_accept_language(),
        }
    }
}

/// CLI output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default export format (markdown, text, json)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "markdown".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: default_format(),
        }
    }
}

impl Config {
    /// Default config file location: ~/.chatlift/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".chatlift").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".chatlift/config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write a default config file, creating parent directories
    pub fn create_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| ExtractError::Config(format!("failed to serialize defaults: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
