//! Retry policy with exponential backoff for transient fetch failures.
//!
//! Every network attempt is turned into an [`AttemptOutcome`]:
//! - [`AttemptOutcome::Success`] - markup received
//! - [`AttemptOutcome::Transient`] - timeout, connection failure, 408, 429, 5xx
//! - [`AttemptOutcome::Permanent`] - other 4xx, invalid URL, TLS failure
//!
//! The [`RetryPolicy`] decides whether a transient failure gets another
//! attempt and how long to wait first.
//!
//! # Example
//!
//! ```
//! use disclosure_scraper::fetch::{FetchError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://bank.example/nav", 503);
//!
//! match policy.should_retry(classify_error(&error), 0) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::FetchError;

/// Default number of additional attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (1 second).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default maximum delay cap (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default maximum jitter added to each delay.
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on retry: timeouts, connection failures, 408, 429, 5xx.
    Transient,

    /// Will not succeed on retry: other 4xx, invalid URL, TLS failures.
    Permanent,
}

/// Tagged result of one network round-trip.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Response body received.
    Success(String),
    /// Failure worth retrying within the budget.
    Transient(FetchError),
    /// Failure returned to the caller immediately.
    Permanent(FetchError),
}

impl AttemptOutcome {
    /// Tags a raw transport result.
    #[must_use]
    pub fn from_result(result: Result<String, FetchError>) -> Self {
        match result {
            Ok(body) => Self::Success(body),
            Err(error) => match classify_error(&error) {
                FailureType::Transient => Self::Transient(error),
                FailureType::Permanent => Self::Permanent(error),
            },
        }
    }
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * 2^attempt_index, max_delay) + jitter
/// ```
///
/// `attempt_index` is the 0-based index of the attempt that just failed, so
/// with defaults the waits are roughly 1s, 2s, 4s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first.
    max_retries: u32,

    /// Delay before the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Upper bound of the random jitter added to each delay.
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_MAX_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with explicit settings.
    #[must_use]
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        max_jitter: Duration,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_jitter,
        }
    }

    /// Creates a policy with a custom retry budget, using defaults otherwise.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Creates a policy with a custom budget and base delay, default cap and jitter.
    #[must_use]
    pub fn with_backoff(max_retries: u32, base_delay: Duration) -> Self {
        Self::new(max_retries, base_delay, DEFAULT_MAX_DELAY, DEFAULT_MAX_JITTER)
    }

    /// Returns a copy of this policy without jitter.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Returns the configured retry budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decides whether to retry after the attempt at `attempt_index` failed.
    ///
    /// `attempt_index` is 0 for the initial attempt.
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt_index: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt_index >= self.max_retries {
            debug!(attempt_index, max = self.max_retries, "retry budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("retry budget ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.backoff_delay(attempt_index) + self.jitter();
        debug!(
            attempt_index,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt_index + 2,
        }
    }

    /// Deterministic part of the delay: `min(base * 2^attempt_index, max_delay)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Classifies a fetch error for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Timeout | Transient |
/// | Connection | Transient |
/// | Body read | Transient |
/// | HTTP 408, 429, 5xx | Transient |
/// | Other HTTP 4xx | Permanent |
/// | TLS | Permanent |
/// | Invalid URL / config | Permanent |
/// | Interrupted | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { status, .. } => classify_http_status(*status),
        FetchError::Timeout { .. } | FetchError::Connection { .. } | FetchError::Body { .. } => {
            FailureType::Transient
        }
        FetchError::Tls { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::InvalidConfig(_)
        | FetchError::Interrupted { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 => FailureType::Transient, // Request Timeout
        429 => FailureType::Transient, // Too Many Requests
        status if (400..500).contains(&status) => FailureType::Permanent,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(32));
    }

    #[test]
    fn test_retry_policy_zero_retries_never_retries() {
        let policy = RetryPolicy::with_max_retries(0);
        let decision = policy.should_retry(FailureType::Transient, 0);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    // ==================== Backoff Tests ====================

    #[test]
    fn test_backoff_doubles_from_attempt_index_zero() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(10),
            Duration::ZERO,
        );
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_respects_max_delay() {
        let policy = RetryPolicy::new(
            10,
            Duration::from_secs(1),
            Duration::from_secs(5),
            Duration::ZERO,
        );
        assert_eq!(policy.backoff_delay(6), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(40), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            assert!(policy.jitter() <= DEFAULT_MAX_JITTER);
        }
    }

    #[test]
    fn test_without_jitter_is_deterministic() {
        let policy = RetryPolicy::new(
            3,
            Duration::from_millis(10),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .without_jitter();
        let decision = policy.should_retry(FailureType::Transient, 1);
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_millis(20),
                attempt: 3,
            }
        );
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_http_404_permanent() {
        let error = FetchError::http_status("http://bank.example", 404);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_http_403_permanent() {
        let error = FetchError::http_status("http://bank.example", 403);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_http_429_and_408_transient() {
        for status in [408, 429] {
            let error = FetchError::http_status("http://bank.example", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "{status}");
        }
    }

    #[test]
    fn test_classify_http_5xx_transient() {
        for status in [500, 502, 503, 504, 599] {
            let error = FetchError::http_status("http://bank.example", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "{status}");
        }
    }

    #[test]
    fn test_classify_timeout_and_connection_transient() {
        assert_eq!(
            classify_error(&FetchError::timeout("http://bank.example")),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&FetchError::connection("http://bank.example", "refused")),
            FailureType::Transient
        );
    }

    #[test]
    fn test_classify_tls_and_invalid_url_permanent() {
        assert_eq!(
            classify_error(&FetchError::tls("https://bank.example", "bad certificate")),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&FetchError::invalid_url("not a url")),
            FailureType::Permanent
        );
    }

    // ==================== Decision Tests ====================

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 0);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("permanent"));
        } else {
            panic!("expected DoNotRetry");
        }
    }

    #[test]
    fn test_should_retry_respects_budget() {
        let policy = RetryPolicy::with_max_retries(2);
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 0),
            RetryDecision::Retry { attempt: 2, .. }
        ));
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        let decision = policy.should_retry(FailureType::Transient, 2);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        } else {
            panic!("expected DoNotRetry");
        }
    }

    #[test]
    fn test_attempt_outcome_tags_results() {
        assert!(matches!(
            AttemptOutcome::from_result(Ok("<html></html>".to_string())),
            AttemptOutcome::Success(_)
        ));
        assert!(matches!(
            AttemptOutcome::from_result(Err(FetchError::http_status("u", 500))),
            AttemptOutcome::Transient(_)
        ));
        assert!(matches!(
            AttemptOutcome::from_result(Err(FetchError::http_status("u", 404))),
            AttemptOutcome::Permanent(_)
        ));
    }
}
