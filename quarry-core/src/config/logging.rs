//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::logging::{LogFormat, LogLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: QUARRY_LOG_LEVEL
    pub level: String,
    /// "human", "json" or "logfmt"
    /// Env: QUARRY_LOG_FORMAT
    pub format: String,
    /// "stdout" or "stderr"
    /// Env: QUARRY_LOG_TARGET
    pub target: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "human".to_string(),
            target: "stderr".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("QUARRY_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("QUARRY_LOG_FORMAT") {
            self.format = format;
        }
        if let Ok(target) = env::var("QUARRY_LOG_TARGET") {
            self.target = target;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if LogLevel::parse(&self.level).is_none() {
            bail!("Invalid log level: {}", self.level);
        }
        if LogFormat::parse(&self.format).is_none() {
            bail!("Invalid log format: {}", self.format);
        }
        if !matches!(self.target.as_str(), "stdout" | "stderr") {
            bail!("Invalid log target: {} (expected stdout or stderr)", self.target);
        }
        Ok(())
    }
}
