//! Chromium-backed browser sessions via the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::SessionError;
use super::session::{BrowserLauncher, BrowserSession, LaunchOptions};

/// Launches a local Chromium for each session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    /// Creates a launcher using the Chromium found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", options.user_agent));
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(error) = event {
                    debug!(%error, "devtools handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(error) => {
                handler_task.abort();
                return Err(SessionError::Launch(error.to_string()));
            }
        };

        debug!(headless = options.headless, "chromium started");
        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page,
            handler_task,
        }))
    }
}

/// One Chromium process with a single page.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, SessionError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn element_exists(&mut self, selector: &str) -> Result<bool, SessionError> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| SessionError::Script(e.to_string()))?;
        self.eval(&format!("document.querySelector({quoted}) !== null"))
            .await
    }

    async fn row_count(&mut self) -> Result<usize, SessionError> {
        self.eval("document.querySelectorAll('tr').length").await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), SessionError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn click_next(&mut self, selector: &str) -> Result<bool, SessionError> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| SessionError::Script(e.to_string()))?;
        self.eval(&format!(
            "(() => {{ \
               for (const el of document.querySelectorAll({quoted})) {{ \
                 const style = window.getComputedStyle(el); \
                 const shown = el.offsetParent !== null && style.visibility !== 'hidden'; \
                 const disabled = el.disabled === true \
                   || el.getAttribute('aria-disabled') === 'true' \
                   || el.classList.contains('disabled'); \
                 if (shown && !disabled) {{ el.click(); return true; }} \
               }} \
               return false; \
             }})()"
        ))
        .await
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Disconnected(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = browser
            .close()
            .await
            .map_err(|e| SessionError::Disconnected(e.to_string()));
        if let Err(error) = browser.wait().await {
            warn!(%error, "chromium did not exit cleanly");
        }
        self.handler_task.abort();
        closed.map(|_| ())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
