use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::alerts::DEFAULT_TIMEOUT_MS;
use crate::applets::DEFAULT_ERROR_MESSAGE;
use crate::error::{CmpError, CmpResult};

/// Longest auto-dismiss timeout accepted from config (10 minutes).
const MAX_ALERT_TIMEOUT_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub applets: AppletsConfig,
    pub messages: MessagesConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppletsConfig {
    /// Namespace applet targets are resolved in ("cui", "hui").
    pub target_application: String,
    /// CMP base URL the applet list is fetched from.
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    /// Local applet list, used instead of the API when set.
    pub applets_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub loading: Option<String>,
    pub loaded: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub timeout_ms: u64,
}

impl Default for AppletsConfig {
    fn default() -> Self {
        Self {
            target_application: "cui".to_string(),
            api_url: None,
            api_token: None,
            applets_file: None,
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            loading: None,
            loaded: None,
            error: Some(DEFAULT_ERROR_MESSAGE.to_string()),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AppletsConfig {
    /// The applet file path with a leading `~` expanded.
    pub fn applets_file_path(&self) -> Option<PathBuf> {
        self.applets_file
            .as_deref()
            .map(|file| PathBuf::from(shellexpand::tilde(file).into_owned()))
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("cmp-applets")
            .join("config.toml")
    }

    /// Load config from the default path, or return defaults if missing or invalid
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from a specific file
    pub fn from_file(path: &Path) -> CmpResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and clamp config values to acceptable ranges
    fn validate(&mut self) -> CmpResult<()> {
        self.applets.target_application = self.applets.target_application.trim().to_string();
        if self.applets.target_application.is_empty() {
            return Err(CmpError::Config(
                "applets.target_application must not be empty".to_string(),
            ));
        }

        self.alerts.timeout_ms = self.alerts.timeout_ms.min(MAX_ALERT_TIMEOUT_MS);
        Ok(())
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> CmpResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CmpError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}
