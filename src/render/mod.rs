//! Dynamic content loading through a headless browser.
//!
//! Some disclosure pages render their net-value table with JavaScript and
//! append rows as the user scrolls. [`DynamicLoader`] drives a
//! [`BrowserSession`] through navigation, an element wait and a scroll loop,
//! follows "next page" controls, then hands back the serialized DOM of every
//! page it visited.
//!
//! The Chromium backend lives behind the `browser` feature.

#[cfg(feature = "browser")]
mod chrome;
mod error;
mod loader;
mod session;

#[cfg(feature = "browser")]
pub use chrome::{ChromeLauncher, ChromeSession};
pub use error::{LoadError, SessionError};
pub use loader::{
    ContentKind, DEFAULT_CONTAINER_SELECTORS, DEFAULT_MAX_PAGES, DEFAULT_NEXT_PAGE_SELECTORS,
    DEFAULT_TABLE_SELECTORS, DynamicLoader, LoaderConfig, LoaderState, RenderedMarkup,
    SettleReason,
};
pub use session::{BrowserLauncher, BrowserSession, LaunchOptions};
