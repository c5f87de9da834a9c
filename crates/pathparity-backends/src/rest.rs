//! REST adapter
//!
//! Speaks the `<base>/<path>.json` HTTP convention of hierarchical JSON
//! stores:
//! - `write` is a PUT, both update shapes are a PATCH on the base path
//! - `read` is a GET where a `null` body means nothing is stored
//! - `delete` is a DELETE
//!
//! The path is sent as given apart from a leading `/` being enforced, so
//! ambiguous paths reach the server unmodified.

use async_trait::async_trait;
use pathparity_core::Updates;
use pathparity_probe::{AdapterError, BackendAdapter, ReadOutcome};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`RestBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Store URL without a trailing slash
    pub base_url: String,
    /// Token appended as `?auth=`
    pub auth_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RestConfig {
    /// Settings for `base_url` with no token and the default timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the auth token
    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the per-request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP backend
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    config: RestConfig,
}

impl RestBackend {
    /// Build the HTTP client
    ///
    /// # Errors
    /// - `AdapterErrorKind::Transport` if the client cannot be constructed
    pub fn new(config: RestConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdapterError::transport(format!("building HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Connection settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Request URL for a store path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let url = format!("{}{separator}{path}.json", self.config.base_url);
        match &self.config.auth_token {
            Some(token) => format!("{url}?auth={token}"),
            None => url,
        }
    }

    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, AdapterError> {
        let url = self.url_for(path);
        tracing::debug!(%method, path, "REST request");

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        tracing::debug!(%method, path, status = status.as_u16(), "REST response");

        if !status.is_success() {
            return Err(rejected(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AdapterError::decode(format!("{path}: {e}")))
    }
}

fn rejected(status: StatusCode, body: &str) -> AdapterError {
    // Stores report failures as {"error": "..."}
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    AdapterError::rejected(Some(status.as_u16()), message)
}

fn map_reqwest_error(err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::timeout(err.to_string())
    } else if err.is_decode() {
        AdapterError::decode(err.to_string())
    } else if let Some(status) = err.status() {
        AdapterError::rejected(Some(status.as_u16()), err.to_string())
    } else {
        AdapterError::transport(err.to_string())
    }
}

#[async_trait]
impl BackendAdapter for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn write(&self, path: &str, value: &Value) -> Result<(), AdapterError> {
        self.send(Method::PUT, path, Some(value)).await.map(drop)
    }

    async fn partial_update(&self, base_path: &str, updates: &Updates) -> Result<(), AdapterError> {
        self.send(Method::PATCH, base_path, Some(updates)).await.map(drop)
    }

    async fn batch_update(&self, base_path: &str, updates: &Updates) -> Result<(), AdapterError> {
        self.send(Method::PATCH, base_path, Some(updates)).await.map(drop)
    }

    async fn read(&self, path: &str) -> Result<ReadOutcome, AdapterError> {
        let value = self.send::<Value>(Method::GET, path, None).await?;
        Ok(ReadOutcome::from_nullable(value))
    }

    async fn delete(&self, path: &str) -> Result<(), AdapterError> {
        self.send::<Value>(Method::DELETE, path, None).await.map(drop)
    }

    fn store_key(&self) -> Option<String> {
        Some(self.config.base_url.clone())
    }
}
