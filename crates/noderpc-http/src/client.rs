//! HTTP transport.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use noderpc_core::error::{ClientError, TransportError};
use noderpc_core::request::JsonRpcRequest;
use noderpc_core::transport::RpcTransport;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout_ms() -> u64 { 30_000 }

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_timeout_ms(),
            headers: BTreeMap::new(),
        }
    }
}

impl HttpTransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Sends each payload as the JSON body of an HTTP POST.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given JSON-RPC endpoint URL.
    ///
    /// Fails with [`ClientError::InvalidConnection`] if the URL or a header
    /// is malformed, or the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, config: HttpTransportConfig) -> Result<Self, ClientError> {
        let url = url.into();
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| ClientError::InvalidConnection(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConnection(format!(
                "{url}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidConnection(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidConnection(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidConnection(e.to_string()))?;

        Ok(Self {
            url,
            http,
            request_timeout: config.request_timeout(),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(url, HttpTransportConfig::default())
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<Value, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn map_reqwest(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        let result = self.post(&req).await;
        if let Err(e) = &result {
            tracing::warn!(url = %self.url, method = %req.method, error = %e, "HTTP request failed");
        }
        result
    }

    /// True HTTP batch: all requests as one JSON array in one POST.
    async fn send_batch(&self, reqs: Vec<JsonRpcRequest>) -> Result<Value, TransportError> {
        let result = self.post(&reqs).await;
        if let Err(e) = &result {
            tracing::warn!(url = %self.url, size = reqs.len(), error = %e, "HTTP batch failed");
        }
        result
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let err = HttpTransport::default_for("not a url").err().unwrap();
        assert!(matches!(err, ClientError::InvalidConnection(_)));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = HttpTransport::default_for("ws://127.0.0.1:8027").err().unwrap();
        assert!(err.to_string().contains("unsupported scheme 'ws'"), "{err}");
    }

    #[test]
    fn rejects_bad_header() {
        let mut config = HttpTransportConfig::default();
        config.headers.insert("bad header".into(), "x".into());
        let err = HttpTransport::new("http://127.0.0.1:8027", config).err().unwrap();
        assert!(matches!(err, ClientError::InvalidConnection(_)));
    }

    #[test]
    fn config_defaults() {
        let config: HttpTransportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.headers.is_empty());
    }
}
