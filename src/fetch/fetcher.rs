//! Retrying page fetcher.

use std::fmt;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::client::{HttpTransport, Transport};
use super::error::FetchError;
use super::retry::{
    AttemptOutcome, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, FailureType, RetryDecision,
    RetryPolicy,
};
use crate::interrupt::Interrupt;

/// Default per-request timeout (30 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request timeout. Must be positive.
    pub timeout: Duration,
    /// Additional attempts after the first on transient failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff_base: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl FetchConfig {
    /// Checks the fetcher constraints.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidConfig`] when `timeout` is zero.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.timeout.is_zero() {
            return Err(FetchError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Final status of a logical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Markup received.
    Success,
    /// Request timed out and no retry followed.
    Timeout,
    /// Connection-level failure and no retry followed.
    ConnectionError,
    /// Server returned this status and no retry followed.
    HttpError(u16),
    /// Transient failures used up the whole retry budget.
    Exhausted,
    /// The interrupt flag aborted a request in flight.
    Interrupted,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Timeout => f.write_str("timeout"),
            Self::ConnectionError => f.write_str("connection error"),
            Self::HttpError(code) => write!(f, "HTTP {code}"),
            Self::Exhausted => f.write_str("retries exhausted"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Outcome of [`Fetcher::fetch`]. Every failure mode lives in `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The requested URL.
    pub url: String,
    /// Final status.
    pub status: FetchStatus,
    /// Markup, present only on success.
    pub body: Option<String>,
    /// Network round-trips made (at least 1).
    pub attempts: u32,
    /// Message of the last failure, if any.
    pub last_error: Option<String>,
}

impl FetchResult {
    fn success(url: &str, body: String, attempts: u32) -> Self {
        Self {
            url: url.to_string(),
            status: FetchStatus::Success,
            body: Some(body),
            attempts,
            last_error: None,
        }
    }

    fn failure(url: &str, status: FetchStatus, attempts: u32, error: &FetchError) -> Self {
        Self {
            url: url.to_string(),
            status,
            body: None,
            attempts,
            last_error: Some(error.to_string()),
        }
    }

    /// Returns true when markup was received.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// Issues page requests with bounded retries and exponential backoff.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
    interrupt: Interrupt,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher backed by a fresh [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidConfig`] if `config` is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(
            Box::new(transport),
            RetryPolicy::with_backoff(config.max_retries, config.backoff_base),
        ))
    }

    /// Creates a fetcher over any transport.
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            interrupt: Interrupt::new(),
        }
    }

    /// Attaches an interrupt flag that aborts requests in flight and cuts
    /// backoff waits short.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Fetches `url`, retrying transient failures within the budget.
    ///
    /// Never fails: the returned [`FetchResult`] carries the status, and
    /// `attempts` is the number of round-trips actually made.
    #[instrument(skip(self), fields(max_retries = self.policy.max_retries()))]
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut attempt_index: u32 = 0;
        loop {
            let attempts = attempt_index + 1;
            let response = tokio::select! {
                biased;
                () = self.interrupt.triggered() => Err(FetchError::interrupted(url)),
                response = self.transport.get(url) => response,
            };
            let outcome = AttemptOutcome::from_result(response);

            let error = match outcome {
                AttemptOutcome::Success(body) => {
                    info!(attempts, bytes = body.len(), "page fetched");
                    return FetchResult::success(url, body, attempts);
                }
                AttemptOutcome::Permanent(error) => {
                    warn!(attempts, error = %error, "permanent fetch failure");
                    return FetchResult::failure(url, status_for(&error), attempts, &error);
                }
                AttemptOutcome::Transient(error) => error,
            };

            match self.policy.should_retry(FailureType::Transient, attempt_index) {
                RetryDecision::Retry { delay, attempt } => {
                    warn!(
                        error = %error,
                        next_attempt = attempt,
                        delay_ms = delay.as_millis(),
                        "transient fetch failure, backing off"
                    );
                    if !self.interrupt.sleep(delay).await {
                        warn!(attempts, "fetch interrupted during backoff");
                        return FetchResult::failure(url, status_for(&error), attempts, &error);
                    }
                    attempt_index += 1;
                }
                RetryDecision::DoNotRetry { reason } => {
                    let status = if attempt_index == 0 {
                        status_for(&error)
                    } else {
                        FetchStatus::Exhausted
                    };
                    warn!(attempts, %reason, %status, "giving up on fetch");
                    return FetchResult::failure(url, status, attempts, &error);
                }
            }
        }
    }
}

fn status_for(error: &FetchError) -> FetchStatus {
    match error {
        FetchError::Timeout { .. } => FetchStatus::Timeout,
        FetchError::Interrupted { .. } => FetchStatus::Interrupted,
        FetchError::HttpStatus { status, .. } => FetchStatus::HttpError(*status),
        FetchError::Connection { .. }
        | FetchError::Tls { .. }
        | FetchError::Body { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::InvalidConfig(_) => FetchStatus::ConnectionError,
    }
}
