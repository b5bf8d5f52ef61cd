use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MuteError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum confidence for a message to enter the candidate store
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Maximum number of messages fetched per run
    #[serde(default = "default_email_limit")]
    pub email_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            email_limit: default_email_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-request timeout for unsubscribe link visits
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Analyze and report only; make no HTTP requests
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_email_limit() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_db_path() -> String {
    "unsubscribe_history.db".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MuteError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MuteError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MuteError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| MuteError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| MuteError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Threshold must be in (0, 1]: zero would admit every message
        if self.analysis.confidence_threshold <= 0.0 || self.analysis.confidence_threshold > 1.0 {
            return Err(MuteError::ConfigError(format!(
                "analysis.confidence_threshold must be in (0.0, 1.0], got {}",
                self.analysis.confidence_threshold
            )));
        }

        if self.analysis.email_limit == 0 {
            return Err(MuteError::ConfigError(
                "analysis.email_limit must be at least 1".to_string(),
            ));
        }

        if self.execution.timeout_secs == 0 {
            return Err(MuteError::ConfigError(
                "execution.timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.history.db_path.is_empty() {
            return Err(MuteError::ConfigError(
                "history.db_path cannot be empty".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
