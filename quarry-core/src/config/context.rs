//! Platform context configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Where the platform lives and how to authenticate against it
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Base URL of the platform
    /// Env: QUARRY_SERVER
    /// Default: "http://localhost:8080"
    pub server: String,

    /// Namespace prefixing every resource path
    /// Env: QUARRY_NAMESPACE
    /// Default: "" (must be set)
    pub namespace: String,

    /// Bearer token
    /// Env: QUARRY_TOKEN
    pub token: Option<String>,

    /// API key sent as a header
    /// Env: QUARRY_API_KEY
    pub api_key: Option<String>,

    /// Basic auth user
    /// Env: QUARRY_USERNAME
    pub username: Option<String>,

    /// Basic auth password
    /// Env: QUARRY_PASSWORD
    pub password: Option<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8080".to_string(),
            namespace: String::new(),
            token: None,
            api_key: None,
            username: None,
            password: None,
        }
    }
}

impl ContextConfig {
    pub fn new(server: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { server: server.into(), namespace: namespace.into(), ..Default::default() }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(server) = env::var("QUARRY_SERVER") {
            self.server = server;
        }
        if let Ok(namespace) = env::var("QUARRY_NAMESPACE") {
            self.namespace = namespace;
        }
        if let Ok(token) = env::var("QUARRY_TOKEN") {
            self.token = Some(token);
        }
        if let Ok(key) = env::var("QUARRY_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(username) = env::var("QUARRY_USERNAME") {
            self.username = Some(username);
        }
        if let Ok(password) = env::var("QUARRY_PASSWORD") {
            self.password = Some(password);
        }
    }

    /// Every reason this context cannot be used, empty when usable
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let server = self.server.trim();
        if server.is_empty() {
            problems.push("server is not set".to_string());
        } else if !(server.starts_with("http://") || server.starts_with("https://")) {
            problems.push(format!("server must be an http(s) URL, got {}", server));
        }
        if self.namespace.trim().is_empty() {
            problems.push("namespace is not set".to_string());
        } else if self.namespace.contains('/') {
            problems.push(format!("namespace must not contain '/', got {}", self.namespace));
        }
        if self.username.is_some() != self.password.is_some() {
            problems.push("basic auth needs both username and password".to_string());
        }
        problems
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if !problems.is_empty() {
            bail!("Invalid context: {}", problems.join(", "));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "***");
        f.debug_struct("ContextConfig")
            .field("server", &self.server)
            .field("namespace", &self.namespace)
            .field("token", &redact(&self.token))
            .field("api_key", &redact(&self.api_key))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problems_are_all_reported() {
        let mut config = ContextConfig::new("ftp://host", "");
        config.username = Some("ada".into());

        let problems = config.problems();
        assert_eq!(problems.len(), 3);
        assert!(config.validate().unwrap_err().to_string().starts_with("Invalid context: server must be"));
    }

    #[test]
    fn test_valid_context() {
        let config = ContextConfig::new("https://platform.example", "acme").with_basic_auth("ada", "pw");
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ContextConfig::new("https://platform.example", "acme").with_token("secret-token");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("***"));
    }
}
