//! Engine configuration.
//!
//! Follows a builder pattern for complex configuration with validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default advisory lock lifetime (5 minutes)
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 300_000;
/// Default autosave cadence (30 seconds)
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 30_000;
/// Upper bound for lock timeouts and autosave intervals (7 days)
pub const MAX_TIMEOUT_MS: u64 = 7 * 24 * 60 * 60 * 1_000;

/// Configuration for the versioning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lifetime of an unrenewed lock
    pub lock_timeout_ms: u64,
    /// Interval after the last edit before an autosave fires
    pub autosave_interval_ms: u64,
    /// Page size used when the caller does not pick one
    pub default_page_size: usize,
    /// Upper bound for `list_versions` page sizes
    pub max_page_size: usize,
    /// Retry once internally when a save races with another writer
    pub retry_on_conflict: bool,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            default_page_size: 20,
            max_page_size: 100,
            retry_on_conflict: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder from the defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 || self.lock_timeout_ms > MAX_TIMEOUT_MS {
            return Err(Error::config_error(format!(
                "lock_timeout_ms must be between 1 and {}",
                MAX_TIMEOUT_MS
            )));
        }
        if self.autosave_interval_ms == 0 || self.autosave_interval_ms > MAX_TIMEOUT_MS {
            return Err(Error::config_error(format!(
                "autosave_interval_ms must be between 1 and {}",
                MAX_TIMEOUT_MS
            )));
        }
        if self.max_page_size == 0 {
            return Err(Error::config_error("max_page_size must be positive"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(Error::config_error(format!(
                "default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid engine configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, yaml).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to save config to {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Builder for EngineConfig
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock_timeout_ms = ms;
        self
    }

    pub fn autosave_interval_ms(mut self, ms: u64) -> Self {
        self.config.autosave_interval_ms = ms;
        self
    }

    pub fn page_sizes(mut self, default: usize, max: usize) -> Self {
        self.config.default_page_size = default;
        self.config.max_page_size = max;
        self
    }

    pub fn retry_on_conflict(mut self, retry: bool) -> Self {
        self.config.retry_on_conflict = retry;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
