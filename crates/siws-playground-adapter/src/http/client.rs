/*
[INPUT]:  HTTP configuration (RPC endpoint, auth base URL, timeouts)
[OUTPUT]: Configured reqwest client ready for RPC and backend calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing response handling
*/

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::{PlaygroundError, Result};
use crate::types::Cluster;

/// Default auth backend for local development
const AUTH_BASE_URL: &str = "http://localhost:3000";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the Solana RPC endpoint and the auth backend
#[derive(Debug, Clone)]
pub struct PlaygroundClient {
    http_client: Client,
    rpc_url: Url,
    auth_base_url: Url,
    timeout: Duration,
}

impl PlaygroundClient {
    /// Create a devnet client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a devnet client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let rpc_url = Cluster::Devnet.default_endpoint().ok_or_else(|| {
            PlaygroundError::Config("devnet has no default endpoint".to_string())
        })?;
        Self::with_config_and_urls(config, rpc_url, AUTH_BASE_URL)
    }

    /// Create a client with explicit RPC and auth backend URLs
    pub fn with_config_and_urls(
        config: ClientConfig,
        rpc_url: &str,
        auth_base_url: &str,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            rpc_url: Url::parse(rpc_url)?,
            auth_base_url: base_url(auth_base_url)?,
            timeout: config.timeout,
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn auth_base_url(&self) -> &Url {
        &self.auth_base_url
    }

    /// Build request builder for the JSON-RPC endpoint
    pub(crate) fn rpc_request(&self) -> RequestBuilder {
        self.http_client.post(self.rpc_url.clone())
    }

    /// Build request builder for auth backend endpoints, relative to the base path
    pub(crate) fn auth_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.auth_base_url.join(endpoint.trim_start_matches('/'))?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode a JSON body, mapping failure statuses to errors
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|err| self.map_send_error(err))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(1);
            return Err(PlaygroundError::RateLimit { retry_after });
        }

        let body = response.text().await.map_err(|err| self.map_send_error(err))?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            let (message, reason) = error_body(&body);
            return Err(PlaygroundError::Api {
                code: status.as_u16(),
                message,
                reason,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| PlaygroundError::InvalidResponse(format!("undecodable body: {e}")))
    }

    fn map_send_error(&self, err: reqwest::Error) -> PlaygroundError {
        if err.is_timeout() {
            PlaygroundError::Timeout {
                duration: self.timeout.as_secs(),
            }
        } else {
            PlaygroundError::Http(err)
        }
    }
}

/// Pull the message and optional reason code out of an error body
/// Parse a base URL so that joined endpoints keep its path
fn base_url(value: &str) -> Result<Url> {
    let mut url = Url::parse(value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn error_body(body: &str) -> (String, Option<String>) {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|value| value.get(name))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    };
    let message = field("message")
        .or_else(|| field("error"))
        .unwrap_or_else(|| body.trim().to_string());
    (message, field("code"))
}
