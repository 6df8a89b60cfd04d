//! Dynamic content loader state machine.
//!
//! ```text
//! Idle -> NavigatePending -> AwaitingElement -> ScrollLoop -> Settled
//!              \                   \              |    ^
//!               \                   \             v    |
//!                \                   \         PageTurn-+
//!                 +-------------------+--------------------> Failed
//! ```
//!
//! When no table selector matches before the element wait runs out, a
//! data-container selector (list layouts) is accepted instead. After each
//! page settles its markup is captured; a visible "next page" control is then
//! clicked and the scroll loop runs again, up to `max_pages` pages.
//!
//! Every browser call is bounded by the page load timeout and races the
//! interrupt flag. The session is closed before `load` returns, whatever the
//! outcome.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::error::{LoadError, SessionError};
use super::session::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::interrupt::Interrupt;

/// Selectors tried, in order, when waiting for the data table.
pub const DEFAULT_TABLE_SELECTORS: [&str; 4] = [
    "table",
    ".data-table",
    ".net-value-table",
    "[class*='table']",
];

/// Selectors accepted when no table appears: list-style data containers.
pub const DEFAULT_CONTAINER_SELECTORS: [&str; 5] = [
    ".data-list",
    ".value-list",
    ".netvalue-list",
    "[class*='list']",
    "[class*='data']",
];

/// Selectors of "next page" controls, tried in order.
pub const DEFAULT_NEXT_PAGE_SELECTORS: [&str; 4] = [
    "a.next",
    ".next-page",
    ".pagination .next",
    "[aria-label*='next']",
];

/// Default number of pages captured per load, the first one included.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Settings for one [`DynamicLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Run the browser without a window.
    pub headless: bool,
    /// Bound on navigation and on every individual browser call.
    pub page_load_timeout: Duration,
    /// Bound on waiting for a table-like element.
    pub element_wait_timeout: Duration,
    /// Maximum scroll-and-wait cycles.
    pub max_scroll_times: u32,
    /// Wait after each scroll before re-counting rows.
    pub scroll_delay: Duration,
    /// Selectors that identify the data table.
    pub table_selectors: Vec<String>,
    /// How often element presence is re-checked.
    pub element_poll_interval: Duration,
    /// Fallback selectors checked once the table wait runs out.
    pub container_selectors: Vec<String>,
    /// "Next page" controls, tried in order after each page settles.
    pub next_page_selectors: Vec<String>,
    /// Pages captured per load, the first one included.
    pub max_pages: u32,
    /// Wait after clicking a "next page" control.
    pub page_turn_delay: Duration,
}

fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(ToString::to_string).collect()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            headless: true,
            page_load_timeout: Duration::from_secs(30),
            element_wait_timeout: Duration::from_secs(20),
            max_scroll_times: 10,
            scroll_delay: Duration::from_secs(2),
            table_selectors: owned(&DEFAULT_TABLE_SELECTORS),
            element_poll_interval: Duration::from_millis(250),
            container_selectors: owned(&DEFAULT_CONTAINER_SELECTORS),
            next_page_selectors: owned(&DEFAULT_NEXT_PAGE_SELECTORS),
            max_pages: DEFAULT_MAX_PAGES,
            page_turn_delay: Duration::from_secs(3),
        }
    }
}

/// Loader lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Nothing started.
    Idle,
    /// Navigation issued, waiting for the page.
    NavigatePending,
    /// Page loaded, waiting for a table-like element.
    AwaitingElement,
    /// Scrolling to trigger lazy-loaded rows.
    ScrollLoop,
    /// Moving to the next page of the listing.
    PageTurn,
    /// Markup captured.
    Settled,
    /// Run aborted.
    Failed,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::NavigatePending => "navigate-pending",
            Self::AwaitingElement => "awaiting-element",
            Self::ScrollLoop => "scroll-loop",
            Self::PageTurn => "page-turn",
            Self::Settled => "settled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why the scroll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// The same row count was observed twice in a row.
    RowCountStable,
    /// `max_scroll_times` cycles ran without the count settling.
    ScrollBudgetExhausted,
}

/// What satisfied the element wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A table selector matched.
    Table,
    /// Only a list-style data container was found.
    DataContainer,
}

/// Fully rendered page produced by a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkup {
    /// The URL that was loaded.
    pub url: String,
    /// Serialized DOM of each captured page, in visiting order.
    pub pages: Vec<String>,
    /// Selector that satisfied the element wait.
    pub matched_selector: String,
    /// Whether the page holds a table or only a data container.
    pub content: ContentKind,
    /// Scroll cycles performed over all pages.
    pub scroll_cycles: u32,
    /// Row count at the last observation of the last page.
    pub row_count: usize,
    /// Why scrolling stopped on the last page.
    pub settle_reason: SettleReason,
}

impl RenderedMarkup {
    /// Markup of the first page.
    #[must_use]
    pub fn html(&self) -> &str {
        self.pages.first().map_or("", String::as_str)
    }
}

/// Drives a browser session to obtain JavaScript-rendered markup.
pub struct DynamicLoader {
    launcher: Arc<dyn BrowserLauncher>,
    config: LoaderConfig,
    interrupt: Interrupt,
}

impl fmt::Debug for DynamicLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct ScrollSummary {
    cycles: u32,
    row_count: usize,
    reason: SettleReason,
}

impl DynamicLoader {
    /// Creates a loader that starts sessions through `launcher`.
    #[must_use]
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: LoaderConfig) -> Self {
        Self {
            launcher,
            config,
            interrupt: Interrupt::new(),
        }
    }

    /// Attaches an interrupt flag that aborts waits.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Returns the loader configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads `url` in a fresh browser session and returns the rendered markup.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NavigationTimeout`], [`LoadError::ElementNotFound`],
    /// [`LoadError::SessionCrash`] or [`LoadError::Interrupted`]. The session
    /// is closed before returning in every case.
    #[instrument(skip(self), fields(max_scroll_times = self.config.max_scroll_times, max_pages = self.config.max_pages))]
    pub async fn load(&self, url: &str) -> Result<RenderedMarkup, LoadError> {
        let mut state = LoaderState::Idle;
        let options = LaunchOptions {
            headless: self.config.headless,
            ..LaunchOptions::default()
        };

        let timeout = self.config.page_load_timeout;
        let mut session = match tokio::time::timeout(timeout, self.launcher.launch(&options)).await
        {
            Ok(Ok(session)) => session,
            Ok(Err(error)) => {
                warn!(%error, "browser launch failed");
                return Err(error.into());
            }
            Err(_) => {
                warn!(?timeout, "browser launch timed out");
                return Err(LoadError::SessionCrash(format!(
                    "browser did not start within {timeout:?}"
                )));
            }
        };

        let result = self.drive(session.as_mut(), url, &mut state).await;

        if let Err(error) = session.close().await {
            warn!(%error, "failed to close browser session");
        } else {
            debug!("browser session closed");
        }

        match &result {
            Ok(markup) => {
                debug!(selector = %markup.matched_selector, content = ?markup.content, "markup captured");
                transition(&mut state, LoaderState::Settled);
                info!(
                    pages = markup.pages.len(),
                    rows = markup.row_count,
                    scroll_cycles = markup.scroll_cycles,
                    reason = ?markup.settle_reason,
                    "dynamic page settled"
                );
            }
            Err(error) => {
                transition(&mut state, LoaderState::Failed);
                warn!(%error, "dynamic load failed");
            }
        }
        result
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        state: &mut LoaderState,
    ) -> Result<RenderedMarkup, LoadError> {
        transition(state, LoaderState::NavigatePending);
        self.navigate(session, url).await?;

        transition(state, LoaderState::AwaitingElement);
        let (matched_selector, content) = self.wait_for_content(session).await?;

        let mut pages: Vec<String> = Vec::new();
        let mut scroll_cycles = 0;
        let last = loop {
            transition(state, LoaderState::ScrollLoop);
            let summary = self.scroll_until_settled(session).await?;
            scroll_cycles += summary.cycles;

            let html = self.bounded(session.page_source()).await?;
            if pages.last().is_some_and(|previous| *previous == html) {
                debug!(pages = pages.len(), "next page control left the page unchanged");
                break summary;
            }
            pages.push(html);
            if pages.len() >= self.page_budget() {
                break summary;
            }

            transition(state, LoaderState::PageTurn);
            if !self.turn_page(session).await? {
                break summary;
            }
        };

        Ok(RenderedMarkup {
            url: url.to_string(),
            pages,
            matched_selector,
            content,
            scroll_cycles,
            row_count: last.row_count,
            settle_reason: last.reason,
        })
    }

    fn page_budget(&self) -> usize {
        usize::try_from(self.config.max_pages.max(1)).unwrap_or(usize::MAX)
    }

    async fn navigate(&self, session: &mut dyn BrowserSession, url: &str) -> Result<(), LoadError> {
        let timeout = self.config.page_load_timeout;
        tokio::select! {
            biased;
            () = self.interrupt.triggered() => Err(LoadError::Interrupted),
            outcome = tokio::time::timeout(timeout, session.navigate(url)) => match outcome {
                Err(_) => Err(LoadError::NavigationTimeout { url: url.to_string(), timeout }),
                Ok(result) => result.map_err(LoadError::from),
            },
        }
    }

    /// Polls the table selectors until one matches; once the wait runs out,
    /// accepts a data container instead.
    async fn wait_for_content(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<(String, ContentKind), LoadError> {
        let waited = self.config.element_wait_timeout;
        let deadline = Instant::now() + waited;

        loop {
            for selector in &self.config.table_selectors {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let exists = match tokio::time::timeout(remaining, session.element_exists(selector)).await {
                    Err(_) => return self.container_fallback(session).await,
                    Ok(result) => result?,
                };
                if exists {
                    debug!(%selector, "table element present");
                    return Ok((selector.clone(), ContentKind::Table));
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.container_fallback(session).await;
            }
            if !self
                .interrupt
                .sleep(self.config.element_poll_interval.min(remaining))
                .await
            {
                return Err(LoadError::Interrupted);
            }
        }
    }

    async fn container_fallback(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<(String, ContentKind), LoadError> {
        warn!("no table element appeared, looking for a data container");
        for selector in &self.config.container_selectors {
            if self.bounded(session.element_exists(selector)).await? {
                info!(%selector, "data container present");
                return Ok((selector.clone(), ContentKind::DataContainer));
            }
        }
        Err(LoadError::ElementNotFound {
            selectors: self
                .config
                .table_selectors
                .iter()
                .chain(&self.config.container_selectors)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            waited: self.config.element_wait_timeout,
        })
    }

    /// Clicks the first usable "next page" control and waits for the new page.
    ///
    /// Returns `false` when no control could be clicked.
    async fn turn_page(&self, session: &mut dyn BrowserSession) -> Result<bool, LoadError> {
        for selector in &self.config.next_page_selectors {
            if self.bounded(session.click_next(selector)).await? {
                debug!(%selector, "next page control clicked");
                if !self.interrupt.sleep(self.config.page_turn_delay).await {
                    return Err(LoadError::Interrupted);
                }
                return Ok(true);
            }
        }
        debug!("no next page control");
        Ok(false)
    }

    /// Scrolls until the row count repeats or the budget runs out.
    ///
    /// The baseline count is taken before the first scroll, so a table that
    /// stops growing after `s` scrolls settles after `s + 1` cycles.
    async fn scroll_until_settled(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<ScrollSummary, LoadError> {
        let mut previous = self.bounded(session.row_count()).await?;
        debug!(rows = previous, "baseline row count");

        let mut cycles = 0;
        while cycles < self.config.max_scroll_times {
            self.bounded(session.scroll_to_bottom()).await?;
            cycles += 1;
            if !self.interrupt.sleep(self.config.scroll_delay).await {
                return Err(LoadError::Interrupted);
            }

            let current = self.bounded(session.row_count()).await?;
            debug!(cycle = cycles, previous, current, "scroll cycle");
            if current == previous {
                return Ok(ScrollSummary {
                    cycles,
                    row_count: current,
                    reason: SettleReason::RowCountStable,
                });
            }
            previous = current;
        }

        Ok(ScrollSummary {
            cycles,
            row_count: previous,
            reason: SettleReason::ScrollBudgetExhausted,
        })
    }

    /// Runs one browser call bounded by the page load timeout and the interrupt flag.
    async fn bounded<T, F>(&self, call: F) -> Result<T, LoadError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        let timeout = self.config.page_load_timeout;
        tokio::select! {
            biased;
            () = self.interrupt.triggered() => Err(LoadError::Interrupted),
            outcome = tokio::time::timeout(timeout, call) => match outcome {
                Err(_) => Err(LoadError::SessionCrash(format!(
                    "browser call did not answer within {timeout:?}"
                ))),
                Ok(result) => result.map_err(LoadError::from),
            },
        }
    }
}

fn transition(state: &mut LoaderState, next: LoaderState) {
    debug!(from = %state, to = %next, "loader transition");
    *state = next;
}
