//! Shared User-Agent strings for HTTP and browser sessions.
//!
//! Disclosure pages on bank sites tend to serve reduced markup (or nothing)
//! to non-browser agents, so both acquisition paths present the same
//! desktop Chrome identity.

/// Desktop Chrome User-Agent sent by the HTTP transport and the browser session.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
