//! HTTP transport for provider requests.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ProviderKind;
use crate::error::CommitError;
use crate::provider::request::HttpRequest;

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Environment variable to override the request timeout.
pub const HTTP_TIMEOUT_ENV_VAR: &str = "CMAI_HTTP_TIMEOUT";

/// Status and body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends built requests to a provider.
///
/// This abstraction allows replacing the network in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response.
    ///
    /// Fails with [`CommitError::ProviderUnreachable`] when no response
    /// arrives. Non-2xx responses are returned, not errors.
    async fn send(
        &self,
        provider: ProviderKind,
        request: &HttpRequest,
    ) -> Result<RawResponse, CommitError>;
}

/// Get the configured request timeout.
///
/// Reads from CMAI_HTTP_TIMEOUT if set, otherwise uses 30 seconds. Logs a
/// warning if the variable is set but not a number of seconds.
pub fn http_timeout() -> Duration {
    match env::var(HTTP_TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    HTTP_TIMEOUT_ENV_VAR, v, DEFAULT_HTTP_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
    }
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Transport with the timeout from [`http_timeout`].
    pub fn new() -> Result<Self, CommitError> {
        Self::with_timeout(http_timeout())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CommitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CommitError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        provider: ProviderKind,
        request: &HttpRequest,
    ) -> Result<RawResponse, CommitError> {
        debug!(method = %request.method, url = %request.url, "Sending provider request");

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify(provider, &request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(provider, &request.url, e))?
            .to_vec();

        debug!(status, bytes = body.len(), "Received provider response");
        Ok(RawResponse { status, body })
    }
}

impl HttpTransport {
    fn classify(&self, provider: ProviderKind, url: &str, err: reqwest::Error) -> CommitError {
        if err.is_builder() {
            return CommitError::InvalidConfig(format!("invalid request URL '{url}': {err}"));
        }
        let reason = if err.is_timeout() {
            format!("request to {url} timed out after {}s", self.timeout.as_secs())
        } else if err.is_connect() {
            format!("could not connect to {url}")
        } else {
            format!("request to {url} failed: {err}")
        };
        CommitError::ProviderUnreachable { provider, reason }
    }
}
