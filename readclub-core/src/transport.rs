use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::{ClientCfg, CredentialMode};
use crate::error::{CoreResult, ReadClubError, TransportError};

/// Per-call overrides layered on top of the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One outgoing request as the pipeline sees it. Re-issues clone the
/// original, so hooks never observe each other's outbound edits.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base endpoint (an absolute URL is used as is).
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            query: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_options(mut self, opts: RequestOptions) -> Self {
        self.headers.extend(opts.headers);
        self.query.extend(opts.query);
        if opts.timeout.is_some() {
            self.timeout = opts.timeout;
        }
        self
    }

    /// Path without any query string.
    pub fn bare_path(&self) -> &str {
        self.path.split(['?', '#']).next().unwrap_or_default()
    }
}

/// Response as returned by the transport, before any hook ran.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Generic HTTP transport the client sits on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one attempt. Any received response, whatever its status, is
    /// `Ok`; `Err` means no response arrived.
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError>;
}

/// Thin wrapper around reqwest::Client with the configured defaults.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    base: String,
}

impl ReqwestTransport {
    pub fn new(cfg: &ClientCfg) -> CoreResult<Self> {
        let mut headers = HeaderMap::new();
        for (k, v) in &cfg.default_headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| ReadClubError::Validation(format!("invalid header name '{k}': {e}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| ReadClubError::Validation(format!("invalid value for header '{k}': {e}")))?;
            headers.insert(name, value);
        }
        let inner = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .default_headers(headers)
            .cookie_store(cfg.credential_mode == CredentialMode::IncludeCookies)
            .user_agent("readclub/0.1")
            .build()
            .map_err(|e| ReadClubError::Other(anyhow::anyhow!("http client build failed: {e}")))?;
        Ok(Self {
            inner,
            base: cfg.base_endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .inner
            .request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
