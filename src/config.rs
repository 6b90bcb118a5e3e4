use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{API_BASE, INVITATION_CODE};

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Input and cache file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Newline-delimited credential file.
    #[serde(default = "default_data_file")]
    pub data: PathBuf,
    /// JSON id → token cache.
    #[serde(default = "default_token_file")]
    pub tokens: PathBuf,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.txt")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            data: default_data_file(),
            tokens: default_token_file(),
        }
    }
}

/// Vendor API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_invitation_code")]
    pub invitation_code: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    API_BASE.to_string()
}

fn default_invitation_code() -> String {
    INVITATION_CODE.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            invitation_code: default_invitation_code(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Wait between two full passes over the accounts.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Pause after each account.
    #[serde(default = "default_delay_ms")]
    pub account_delay_ms: u64,
    /// Pause after each task completion attempt.
    #[serde(default = "default_delay_ms")]
    pub task_delay_ms: u64,
}

fn default_cooldown() -> u64 {
    180
}

fn default_delay_ms() -> u64 {
    1000
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            account_delay_ms: default_delay_ms(),
            task_delay_ms: default_delay_ms(),
        }
    }
}

impl SettingsConfig {
    pub fn account_delay(&self) -> Duration {
        Duration::from_millis(self.account_delay_ms)
    }

    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
