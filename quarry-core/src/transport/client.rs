//! reqwest implementation of [`Transport`]

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{ContextConfig, QuarryConfig, TransportConfig};
use crate::error::{Error, Result};
use crate::transport::{BoxError, ResponseBody, Transport, TransportRequest, TransportResponse};

/// HTTP transport joining the configured server URL with request paths
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    server: String,
    settings: ContextConfig,
    api_key_header: String,
}

impl HttpTransport {
    pub fn new(context: &ContextConfig, transport: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(transport.timeout_secs))
            .user_agent(transport.user_agent.clone())
            .build()
            .map_err(|e| Error::configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            server: context.server.trim_end_matches('/').to_string(),
            settings: context.clone(),
            api_key_header: transport.api_key_header.clone(),
        })
    }

    pub fn from_config(config: &QuarryConfig) -> Result<Self> {
        Self::new(&config.context, &config.transport)
    }

    /// Absolute URL with percent-encoded query values
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server, encode_query(path))
    }
}

/// Percent-encode every query value of `path`, leaving keys and the path as is
pub fn encode_query(path: &str) -> String {
    let Some((base, query)) = path.split_once('?') else {
        return path.to_string();
    };
    let encoded: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", key, urlencoding::encode(value)),
            None => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, encoded.join("&"))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> std::result::Result<TransportResponse, BoxError> {
        let mut builder = self.client.request(request.method.clone(), self.url_for(&request.path));

        if let Some(token) = &self.settings.token {
            builder = builder.bearer_auth(token);
        } else if let Some(key) = &self.settings.api_key {
            builder = builder.header(self.api_key_header.as_str(), key.as_str());
        } else if let Some(username) = &self.settings.username {
            builder = builder.basic_auth(username, self.settings.password.as_ref());
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() { ResponseBody::Empty } else { ResponseBody::Bytes(bytes) };

        Ok(TransportResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query_values_only() {
        assert_eq!(
            encode_query(r#"/acme/resources/Widget?where={"count":3}&paging=limit:10"#),
            "/acme/resources/Widget?where=%7B%22count%22%3A3%7D&paging=limit%3A10"
        );
        assert_eq!(encode_query("/acme/resources/Widget"), "/acme/resources/Widget");
    }

    #[test]
    fn test_url_joins_server_without_double_slash() {
        let context = ContextConfig::new("https://platform.example/", "acme");
        let transport = HttpTransport::new(&context, &TransportConfig::default()).unwrap();
        assert_eq!(
            transport.url_for("/acme/resources/Widget?fields=a,b"),
            "https://platform.example/acme/resources/Widget?fields=a%2Cb"
        );
    }
}
