//! Configuration system for Quarry
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`QUARRY_*`)
//! 2. **Config File** (quarry.toml)
//! 3. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use quarry_core::config::QuarryConfig;
//!
//! // Load with full supersedence
//! let config = QuarryConfig::load()?;
//!
//! // Or load from specific file
//! let config = QuarryConfig::from_file("quarry.toml")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod context;
pub mod logging;
pub mod transport;

pub use context::ContextConfig;
pub use logging::LoggingConfig;
pub use transport::TransportConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete Quarry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    pub context: ContextConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
}

impl QuarryConfig {
    /// Load `quarry.toml` from the working directory, then the environment
    pub fn load() -> Result<Self> {
        Self::load_from("quarry.toml")
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error: defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.context.merge(other.context);
        self.transport.merge(other.transport);
        self.logging.merge(other.logging);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.context.apply_env_vars();
        self.transport.apply_env_vars();
        self.logging.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.context.validate()?;
        self.transport.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
