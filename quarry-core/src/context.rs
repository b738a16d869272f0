//! Platform context: server, namespace, credentials and the transport

use std::fmt;
use std::sync::Arc;

use crate::config::{ContextConfig, QuarryConfig};
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Credentials selected from a context configuration
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    ApiKey(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(***)"),
            Credentials::Basic { username, .. } => write!(f, "Basic({}, ***)", username),
        }
    }
}

/// Everything a network call needs
///
/// Cheap to clone; resources and queries keep their own copy.
#[derive(Clone)]
pub struct Context {
    settings: Arc<ContextConfig>,
    transport: Arc<dyn Transport>,
}

impl Context {
    pub fn new(settings: ContextConfig, transport: Arc<dyn Transport>) -> Self {
        Self { settings: Arc::new(settings), transport }
    }

    /// Context over the reqwest transport described by `config`
    pub fn from_config(config: &QuarryConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(config.context.clone(), Arc::new(transport)))
    }

    pub fn settings(&self) -> &ContextConfig {
        &self.settings
    }

    pub fn server(&self) -> &str {
        &self.settings.server
    }

    pub fn namespace(&self) -> &str {
        &self.settings.namespace
    }

    /// Token, then API key, then basic auth
    pub fn credentials(&self) -> Option<Credentials> {
        let settings = &self.settings;
        if let Some(token) = &settings.token {
            return Some(Credentials::Token(token.clone()));
        }
        if let Some(key) = &settings.api_key {
            return Some(Credentials::ApiKey(key.clone()));
        }
        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::Basic { username: username.clone(), password: password.clone() })
            }
            _ => None,
        }
    }

    /// Fail with [`Error::Context`] listing every problem
    pub fn validate(&self) -> Result<()> {
        let problems = self.settings.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::context(problems.join(", ")))
        }
    }

    /// Validate, perform the round trip and map failures into the taxonomy
    ///
    /// Transport failures become [`Error::Transport`], non-success statuses
    /// [`Error::Api`]. Nothing is retried.
    pub async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.validate()?;
        let method = request.method.clone();
        let path = request.path.clone();
        log::debug!("{} {}", method, path);

        let response = self.transport.request(request).await.map_err(|e| {
            log::error!("{} {} failed: {}", method, path, e);
            Error::Transport(e.to_string())
        })?;

        if !response.is_success() {
            let body = response.body_text();
            log::warn!("{} {} answered {}", method, path, response.status);
            return Err(Error::Api { status: response.status.as_u16(), body });
        }
        Ok(response)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("settings", &self.settings).finish()
    }
}
