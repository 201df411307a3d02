//! HTTP transport for OpenWeatherMap requests
//!
//! The client talks to the network only through the `Transport` trait so that
//! tests can substitute canned responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Errors raised while fetching a URL
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network failure, timeout or unreadable body
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the API key.
        TransportError::Request(err.without_url())
    }
}

/// Performs GET requests and returns the response body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url`, failing on network errors and non-2xx statuses
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// Error body returned by OpenWeatherMap, e.g. `{"cod":401,"message":"Invalid API key"}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// `Transport` backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!(status = status.as_u16(), %message, "OpenWeatherMap request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

/// Extracts the API's error message from a response body, falling back to the body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.trim().to_string(),
    }
}

/// Replaces the value of the `appid` parameter so URLs can be logged
pub fn redact_api_key(url: &str) -> String {
    match url.find("appid=") {
        Some(idx) => {
            let start = idx + "appid=".len();
            let end = url[start..]
                .find('&')
                .map(|offset| start + offset)
                .unwrap_or(url.len());
            format!("{}[REDACTED]{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}
