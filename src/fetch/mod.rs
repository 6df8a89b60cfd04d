//! Resilient page fetching for the static acquisition path.
//!
//! One logical request becomes up to `1 + max_retries` network round-trips.
//! Timeouts, connection failures, 408, 429 and 5xx responses are retried with
//! exponential backoff; other 4xx responses end the fetch immediately.
//!
//! # Example
//!
//! ```no_run
//! use disclosure_scraper::fetch::{FetchConfig, Fetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(&FetchConfig::default())?;
//! let result = fetcher.fetch("https://bank.example/net-value/?prodId=21GS6173").await;
//! println!("{} after {} attempt(s)", result.status, result.attempts);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod fetcher;
mod retry;

pub use client::{HttpTransport, Transport};
pub use error::FetchError;
pub use fetcher::{DEFAULT_FETCH_TIMEOUT, FetchConfig, FetchResult, FetchStatus, Fetcher};
pub use retry::{
    AttemptOutcome, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, FailureType, RetryDecision,
    RetryPolicy, classify_error,
};
