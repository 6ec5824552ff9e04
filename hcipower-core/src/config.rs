//! Configuration management for hcipower
//!
//! Settings are resolved from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LoggingConfig;
use crate::precheck::detector::VC_ON_VSAN_TEST_ID;
use crate::precheck::POWER_OFF_PRECHECK_CATEGORY;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Management endpoint configuration
    pub management: ManagementConfig,
    /// Task polling configuration
    pub polling: PollingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Management endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementConfig {
    /// Base URL of the management service
    pub server: String,
    /// Bearer token for the management service
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Health check category evaluated before power-off
    pub health_category: String,
    /// Test id signalling a management plane hosted inside the cluster
    pub self_hosted_test_id: String,
}

/// Task polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between two task status queries, in milliseconds
    pub interval_ms: u64,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            server: "https://localhost:8443".to_string(),
            token: None,
            request_timeout_secs: 30,
            health_category: POWER_OFF_PRECHECK_CATEGORY.to_string(),
            self_hosted_test_id: VC_ON_VSAN_TEST_ID.to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl PowerConfig {
    /// Load configuration from the first config file found, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Environment variable override
            std::env::var("HCIPOWER_CONFIG").ok().map(PathBuf::from),
            // Standard locations
            Some(PathBuf::from("/etc/hcipower/config.toml")),
            Some(PathBuf::from("./hcipower.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Management
        if let Some(server) = lookup("HCIPOWER_SERVER") {
            self.management.server = server;
        }
        if let Some(token) = lookup("HCIPOWER_TOKEN") {
            self.management.token = Some(token);
        }
        if let Some(timeout) = lookup("HCIPOWER_REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                self.management.request_timeout_secs = timeout;
            }
        }

        // Polling
        if let Some(interval) = lookup("HCIPOWER_POLL_INTERVAL_MS") {
            if let Ok(interval) = interval.parse() {
                self.polling.interval_ms = interval;
            }
        }

        // Logging
        if let Some(level) = lookup("HCIPOWER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("HCIPOWER_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.management.server).map_err(|e| {
            ConfigError::Invalid(format!("server '{}': {}", self.management.server, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "server '{}' must use http or https",
                self.management.server
            )));
        }
        if self.management.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid("polling interval_ms must be positive".to_string()));
        }
        if self.management.health_category.trim().is_empty() {
            return Err(ConfigError::Invalid("health_category must not be empty".to_string()));
        }
        Ok(())
    }
}
