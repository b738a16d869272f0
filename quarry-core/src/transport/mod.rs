//! The network boundary
//!
//! Everything that leaves the process goes through one call,
//! [`Transport::request`]. The core builds [`TransportRequest`]s and reads
//! [`TransportResponse`]s; connection handling, TLS and retries belong to
//! the implementation.

pub mod client;

pub use client::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Opaque failure reported by a transport
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One request toward the platform
///
/// `path` starts with `/` and may carry a query string built by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: JsonValue) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response body as handed back by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(JsonValue),
    Bytes(Bytes),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self { status, headers: Vec::new(), body }
    }

    /// Response with a parsed JSON body; invalid status codes become 500
    pub fn json(status: u16, body: JsonValue) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, ResponseBody::Json(body))
    }

    pub fn empty(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, ResponseBody::Empty)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// First header with this name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The body as JSON; an empty body reads as `null`
    pub fn body_json(&self) -> Result<JsonValue> {
        match &self.body {
            ResponseBody::Empty => Ok(JsonValue::Null),
            ResponseBody::Json(value) => Ok(value.clone()),
            ResponseBody::Bytes(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(JsonValue::Null)
            }
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes).map_err(|e| {
                Error::unexpected(format!("response body is not JSON: {}", e))
            }),
        }
    }

    /// The body as text, for diagnostics
    pub fn body_text(&self) -> String {
        match &self.body {
            ResponseBody::Empty => String::new(),
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// The single call the core makes toward the platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip; failures are opaque to the core
    async fn request(&self, request: TransportRequest) -> std::result::Result<TransportResponse, BoxError>;
}
