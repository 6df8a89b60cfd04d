//! Cooperative interruption for bounded waits.
//!
//! The binary flips a shared flag on Ctrl+C. Backoff sleeps and browser
//! waits race that flag so a shutdown does not have to sit out a timeout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How often a waiting task re-checks the flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared interrupt flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// Creates a flag that is not yet raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag for every clone.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`trigger`](Self::trigger) has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves when the flag is raised.
    pub async fn triggered(&self) {
        while !self.is_triggered() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Sleeps for `delay` unless interrupted first.
    ///
    /// Returns `true` when the full delay elapsed, `false` when interrupted.
    pub async fn sleep(&self, delay: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            biased;
            () = self.triggered() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}
