//! Shared HTTP plumbing for vendor adapters.
//!
//! Wraps a [`reqwest::Client`] with the auth header assembly, JSON
//! handling, and bounded retry loop every adapter needs. Vendor modules
//! only decide URLs, auth schemes, and payload shapes.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, Method, Response};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{ChannelError, ChannelResult};

/// Retry policy for transient vendor failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied to the backoff after each attempt.
    pub backoff_multiplier: f64,
    /// HTTP status codes that trigger a retry.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            retry_status_codes: vec![429, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff delay.
    #[must_use]
    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// Whether a response status should trigger a retry.
    #[must_use]
    pub fn should_retry(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Backoff delay before the given retry attempt (1-based), capped at
    /// the configured maximum.
    #[must_use]
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let raw = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent as i32);
        Duration::from_millis(raw.min(self.max_backoff_ms as f64) as u64)
    }
}

/// How a vendor authenticates requests.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    /// No authentication headers.
    None,
    /// HTTP basic auth.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// Single API key in a vendor-named header.
    ApiKey { header: String, key: String },
    /// Arbitrary header set, for signature schemes.
    Headers(Vec<(String, String)>),
}

/// Timeouts and retry behavior for the shared client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agent: "staylink-channel/0.4".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// JSON HTTP client shared by all vendor adapters.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Build a client with default configuration.
    pub fn new() -> ChannelResult<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Build a client from explicit configuration.
    pub fn with_config(config: &HttpConfig) -> ChannelResult<Self> {
        let client = Client::builder()
            .timeout(config.read_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ChannelError::invalid_configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(HttpClient {
            client,
            retry: config.retry.clone(),
        })
    }

    /// GET a JSON resource.
    pub async fn get(&self, url: &str, auth: &AuthScheme) -> ChannelResult<JsonValue> {
        self.send_json(Method::GET, url, auth, None).await
    }

    /// POST a JSON body.
    pub async fn post(
        &self,
        url: &str,
        auth: &AuthScheme,
        body: &JsonValue,
    ) -> ChannelResult<JsonValue> {
        self.send_json(Method::POST, url, auth, Some(body)).await
    }

    /// PUT a JSON body.
    pub async fn put(
        &self,
        url: &str,
        auth: &AuthScheme,
        body: &JsonValue,
    ) -> ChannelResult<JsonValue> {
        self.send_json(Method::PUT, url, auth, Some(body)).await
    }

    /// DELETE a JSON resource.
    pub async fn delete(&self, url: &str, auth: &AuthScheme) -> ChannelResult<JsonValue> {
        self.send_json(Method::DELETE, url, auth, None).await
    }

    /// Send a request, retrying retryable statuses per the policy.
    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        auth: &AuthScheme,
        body: Option<&JsonValue>,
    ) -> ChannelResult<JsonValue> {
        let mut attempt: u32 = 0;
        loop {
            let mut request = self.client.request(method.clone(), url);
            request = apply_auth(request, auth);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => return Err(map_send_error(url, err)),
            };

            let status = response.status().as_u16();
            if response.status().is_success() {
                return parse_body(response).await;
            }

            if self.retry.should_retry(status) && attempt < self.retry.max_retries {
                attempt += 1;
                let delay =
                    retry_after(&response).unwrap_or_else(|| self.retry.calculate_backoff(attempt));
                warn!(
                    url,
                    status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying vendor request"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            debug!(url, status, "vendor request failed");
            return Err(error_for_status(status, response).await);
        }
    }
}

/// Value of a `Basic` authorization header for the given credentials.
#[must_use]
pub fn basic_credentials(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

fn apply_auth(request: reqwest::RequestBuilder, auth: &AuthScheme) -> reqwest::RequestBuilder {
    match auth {
        AuthScheme::None => request,
        AuthScheme::Basic { username, password } => {
            request.header("Authorization", basic_credentials(username, password))
        }
        AuthScheme::Bearer(token) => request.header("Authorization", format!("Bearer {token}")),
        AuthScheme::ApiKey { header, key } => request.header(header.as_str(), key.as_str()),
        AuthScheme::Headers(headers) => headers
            .iter()
            .fold(request, |req, (name, value)| req.header(name, value)),
    }
}

fn map_send_error(url: &str, err: reqwest::Error) -> ChannelError {
    if err.is_timeout() {
        ChannelError::Timeout {
            message: format!("request to {url} timed out"),
        }
    } else if err.is_connect() {
        ChannelError::connection_failed_with_source(format!("failed to connect to {url}"), err)
    } else if err.is_builder() {
        ChannelError::invalid_configuration(format!("invalid request for {url}: {err}"))
    } else {
        ChannelError::network_with_source(format!("request to {url} failed"), err)
    }
}

async fn parse_body(response: Response) -> ChannelResult<JsonValue> {
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(&text).map_err(|e| ChannelError::Serialization {
        message: format!("invalid JSON from vendor: {e}"),
    })
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn error_for_status(status: u16, response: Response) -> ChannelError {
    let retry_after_secs = retry_after(&response).map(|d| d.as_secs());
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        body.trim().chars().take(200).collect()
    };

    match status {
        401 => ChannelError::AuthenticationFailed,
        429 => ChannelError::RateLimited { retry_after_secs },
        502 | 503 | 504 => ChannelError::ChannelUnavailable { message },
        _ => ChannelError::rejected(status, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            initial_backoff_ms: 10_000,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.calculate_backoff(5), Duration::from_millis(30_000));
    }

    #[test]
    fn test_should_retry_status_codes() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(429));
        assert!(policy.should_retry(503));
        assert!(!policy.should_retry(404));
        assert!(!policy.should_retry(500));
    }

    #[test]
    fn test_disabled_policy() {
        let policy = RetryPolicy::disabled();
        assert_eq!(policy.max_retries, 0);
    }

    #[test]
    fn test_basic_credentials_encoding() {
        assert_eq!(basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
    }
}
