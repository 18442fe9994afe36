//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key (overridden by the GOOGLE_API_KEY env var)
    #[serde(default)]
    pub gemini_api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tool iterations per message
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Remote tool-set configuration
    #[serde(default)]
    pub toolset: ToolsetConfig,

    /// OAuth user-info endpoint queried by the `user_oauth_data` tool
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,

    /// Web launcher configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote tool-set (streaming HTTP endpoint) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsetConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_toolset_endpoint")]
    pub endpoint: String,
}

impl Default for ToolsetConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_toolset_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_iterations() -> usize {
    20
}

fn default_toolset_endpoint() -> String {
    "https://mcp-toolbox-280946129258.asia-southeast1.run.app/mcp/sse".to_string()
}

fn default_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v2/userinfo".to_string()
}

fn default_port() -> u16 {
    18790
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            model: default_model(),
            max_iterations: default_max_iterations(),
            toolset: ToolsetConfig::default(),
            userinfo_url: default_userinfo_url(),
            server: ServerConfig::default(),
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".datalyst")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from file, applying environment overrides
pub fn load() -> Result<Config> {
    let path = config_path();

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'datalyst onboard' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let mut config: Config = serde_json::from_str(&content)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply environment variable overrides to a loaded config
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
        if !key.trim().is_empty() {
            config.gemini_api_key = key;
        }
    }
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

/// Initialize configuration with defaults
pub fn onboard() -> Result<()> {
    let path = config_path();

    if path.exists() {
        return Err(Error::Config(format!(
            "Config already exists at {:?}",
            path
        )));
    }

    save(&Config::default())
}
