//! HTTP transport used by the fetcher.
//!
//! [`Transport`] is the seam between the retry loop and the network: one call
//! is one round-trip. [`HttpTransport`] implements it over `reqwest` with
//! browser-like default headers and a per-client cookie store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::error::FetchError;
use crate::user_agent;

/// A single network round-trip returning the response body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for timeouts, connection failures, non-success
    /// statuses and unreadable bodies.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed transport.
///
/// Built once per pipeline run; runs never share a client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidConfig`] if the client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = base_client_builder(timeout)
            .build()
            .map_err(|e| FetchError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::timeout(url)
                } else {
                    FetchError::body(url, e.to_string())
                }
            })?;
        debug!(bytes = body.len(), "response body received");
        Ok(body)
    }
}

fn map_reqwest_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::timeout(url);
    }
    let message = error_chain_message(error);
    if is_tls_message(&message) {
        FetchError::tls(url, message)
    } else {
        FetchError::connection(url, message)
    }
}

fn error_chain_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn is_tls_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("certificate")
        || lowered.contains("tls")
        || lowered.contains("ssl")
        || lowered.contains("handshake")
}

fn base_client_builder(timeout: Duration) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.6,en;q=0.5"),
    );

    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .gzip(true)
        .cookie_store(true)
        .default_headers(headers)
        .user_agent(user_agent::BROWSER_USER_AGENT)
}
