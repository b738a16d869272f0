//! HTTP transport configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Request timeout in seconds
    /// Env: QUARRY_TIMEOUT_SECS
    /// Default: 30
    pub timeout_secs: u64,

    /// User-Agent header
    /// Env: QUARRY_USER_AGENT
    pub user_agent: String,

    /// Header carrying the API key credential
    /// Env: QUARRY_API_KEY_HEADER
    /// Default: "x-api-key"
    pub api_key_header: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("quarry/{}", env!("CARGO_PKG_VERSION")),
            api_key_header: "x-api-key".to_string(),
        }
    }
}

impl TransportConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(timeout) = env::var("QUARRY_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }
        if let Ok(agent) = env::var("QUARRY_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Ok(header) = env::var("QUARRY_API_KEY_HEADER") {
            self.api_key_header = header;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("Invalid timeout_secs: must be greater than 0");
        }
        if self.api_key_header.trim().is_empty() {
            bail!("Invalid api_key_header: cannot be empty");
        }
        Ok(())
    }
}
