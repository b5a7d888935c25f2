//! HTTP transport for the tracker backend.
//!
//! Data sources talk to the backend through the [`Transport`] trait so that
//! tests can substitute [`MockTransport`](crate::MockTransport).
//!
//! # Example
//!
//! ```no_run
//! use eisbach_core::{HttpTransport, Transport, endpoints};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("http://localhost:8080")?;
//! let body = transport.get(endpoints::WATER_CONDITIONS, &[]).await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Backend endpoint paths.
pub mod endpoints {
    pub const SURFERS: &str = "/surfers";
    pub const PREDICT: &str = "/surfers/predict";
    pub const WATER_CONDITIONS: &str = "/conditions/water";
    pub const WATER_HISTORY: &str = "/conditions/water/history";
    pub const WATER_TEMPERATURE: &str = "/conditions/water/temperature";
    /// Older backends serve the temperature here.
    pub const WATER_TEMPERATURE_ALIAS: &str = "/conditions/water-temperature";
}

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters as name/value pairs.
pub type Query = [(String, String)];

/// Request/response exchange with the backend.
///
/// Implementations return the raw response body of 2xx responses and map
/// everything else to an [`Error`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}{path}?{query}`.
    async fn get(&self, path: &str, query: &Query) -> Result<String>;

    /// `POST {base}{path}` with a JSON body.
    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String>;
}

/// Decode a JSON response body.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(Error::from)
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `"http://localhost:8080"`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client, timeout)
    }

    /// Create a transport with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn finish(&self, operation: String, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(operation.clone(), self.timeout)
            } else if e.is_connect() {
                Error::Unreachable(format!("{operation}: {e}"))
            } else {
                Error::Transport(e)
            }
        })?;

        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "Backend returned error status");
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<String> {
        debug!(path, "GET");
        let request = self.client.get(self.url(path)).query(query);
        self.finish(format!("GET {path}"), request).await
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String> {
        debug!(path, "POST");
        let request = self.client.post(self.url(path)).json(body);
        self.finish(format!("POST {path}"), request).await
    }
}

/// Trim trailing slashes and require an http(s) scheme.
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::invalid_config(format!(
            "URL must start with http:// or https://, got: {base_url}"
        )));
    }
    Ok(base_url)
}
