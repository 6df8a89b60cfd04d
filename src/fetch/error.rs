//! Error types for the fetch module.
//!
//! Transport errors carry the URL they happened on so the retry loop can log
//! them with context. They never escape [`Fetcher::fetch`](super::Fetcher::fetch):
//! every failure is folded into a [`FetchResult`](super::FetchResult) status.

use thiserror::Error;

/// Errors produced by a single network attempt or by fetcher construction.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request timed out before a response arrived.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Connection-level failure (DNS, refused, reset).
    #[error("connection error fetching {url}: {message}")]
    Connection {
        /// The URL that failed.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// TLS or certificate failure; retrying will not help.
    #[error("TLS error fetching {url}: {message}")]
    Tls {
        /// The URL that failed.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Body could not be read or decoded.
    #[error("failed to read body of {url}: {message}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// The URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Fetcher configuration violates its constraints.
    #[error("invalid fetch configuration: {0}")]
    InvalidConfig(String),

    /// The interrupt flag was raised while the request was in flight.
    #[error("request to {url} aborted by interrupt")]
    Interrupted {
        /// The URL whose request was dropped.
        url: String,
    },
}

impl FetchError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a TLS error.
    pub fn tls(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tls {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Body {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an interrupted-request error.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which reqwest
// errors do not always carry. `HttpTransport` maps errors explicitly.
