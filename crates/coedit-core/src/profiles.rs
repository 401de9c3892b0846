//! Pre-configured profiles for different deployment scenarios
//!
//! - Development: Verbose logging, default timeouts
//! - Production: Quieter logging, default timeouts
//! - Testing: Short lock and autosave windows for fast suites

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use std::str::FromStr;

/// Profile selector for pre-configured deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigProfile {
    /// Development: DEBUG logging
    Development,
    /// Production: INFO logging
    Production,
    /// Testing: 1s locks, 100ms autosave
    Testing,
}

impl ConfigProfile {
    /// Create an EngineConfig from this profile
    pub fn create_config(self) -> EngineConfig {
        let mut config = EngineConfig::new();

        match self {
            Self::Development => {
                config.log_level = "DEBUG".to_string();
            }
            Self::Production => {
                config.log_level = "INFO".to_string();
                config.retry_on_conflict = true;
            }
            Self::Testing => {
                config.log_level = "WARN".to_string();
                config.lock_timeout_ms = 1_000;
                config.autosave_interval_ms = 100;
                config.default_page_size = 5;
            }
        }

        config
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        }
    }
}

impl FromStr for ConfigProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "testing" | "test" => Ok(Self::Testing),
            other => Err(Error::config_error(format!("Unknown profile: {}", other))),
        }
    }
}
