//! Error types for the dynamic loader.

use std::time::Duration;

use thiserror::Error;

/// Why a dynamic load failed. The browser session is closed in every case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Navigation did not finish within the page load timeout.
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout {
        /// The URL being loaded.
        url: String,
        /// The configured page load timeout.
        timeout: Duration,
    },

    /// None of the table selectors matched before the element wait timeout.
    #[error("element not found: none of [{selectors}] appeared within {waited:?}")]
    ElementNotFound {
        /// Comma-joined selectors that were tried.
        selectors: String,
        /// How long the loader waited.
        waited: Duration,
    },

    /// The browser session failed (launch, crash, navigation or script error).
    #[error("browser session crashed: {0}")]
    SessionCrash(String),

    /// The run was interrupted while waiting.
    #[error("load interrupted")]
    Interrupted,
}

/// Low-level failure reported by a [`BrowserSession`](super::BrowserSession).
///
/// The loader converts these into [`LoadError::SessionCrash`]; they never
/// reach pipeline callers directly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The browser could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation was rejected or the page failed to load.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A script or DOM query failed.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// The browser or page is gone.
    #[error("browser connection lost: {0}")]
    Disconnected(String),
}

impl From<SessionError> for LoadError {
    fn from(error: SessionError) -> Self {
        Self::SessionCrash(error.to_string())
    }
}
