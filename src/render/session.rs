//! Browser session seam.
//!
//! The loader drives pages only through these traits, so the state machine
//! can be exercised against a scripted DOM in tests and against Chromium in
//! production (`browser` feature).

use async_trait::async_trait;

use super::error::SessionError;
use crate::user_agent::BROWSER_USER_AGENT;

/// Options applied when a browser is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Viewport width in pixels.
    pub window_width: u32,
    /// Viewport height in pixels.
    pub window_height: u32,
    /// User-Agent presented by the page.
    pub user_agent: String,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// One open browser page.
///
/// Implementations must make [`close`](Self::close) idempotent; the loader
/// calls it exactly once per run, but a dropped session may already have
/// torn itself down.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the page to `url` and waits for the load event.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Returns whether `selector` currently matches an element.
    async fn element_exists(&mut self, selector: &str) -> Result<bool, SessionError>;

    /// Counts table rows currently in the DOM.
    async fn row_count(&mut self) -> Result<usize, SessionError>;

    /// Scrolls the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError>;

    /// Clicks the first visible, enabled element matching `selector`.
    ///
    /// Returns `false` when nothing clickable matched.
    async fn click_next(&mut self, selector: &str) -> Result<bool, SessionError>;

    /// Returns the serialized DOM.
    async fn page_source(&mut self) -> Result<String, SessionError>;

    /// Closes the page and the browser process.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Starts browser sessions. One session per load; sessions are never shared.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Starts a browser and opens a blank page.
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError>;
}
