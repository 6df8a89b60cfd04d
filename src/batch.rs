//! Concurrent scraping of several URLs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::ScrapeConfig;
use crate::interrupt::Interrupt;
use crate::pipeline::{AcquisitionMode, Pipeline, PipelineError, ScrapeOutcome};
use crate::render::BrowserLauncher;

/// Minimum allowed concurrency.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency.
pub const MAX_CONCURRENCY: usize = 16;

/// Errors constructing a [`BatchRunner`].
#[derive(Debug, Error)]
pub enum BatchError {
    /// Concurrency outside `1..=16`.
    #[error("invalid concurrency {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}")]
    InvalidConcurrency {
        /// Rejected value.
        value: usize,
    },
}

/// Result for one URL of a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Position in the input list.
    pub index: usize,
    /// The URL.
    pub url: String,
    /// Outcome of its pipeline run.
    pub result: Result<ScrapeOutcome, PipelineError>,
}

/// Success and failure counters, updated as tasks finish.
#[derive(Debug, Default)]
pub struct BatchStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl BatchStats {
    /// Runs finished successfully so far.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Runs failed so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Runs finished so far.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.succeeded() + self.failed()
    }

    fn record(&self, ok: bool) {
        if ok {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs one independent pipeline per URL, bounded by a semaphore.
///
/// Each task builds its own fetcher or browser session from the shared
/// configuration; only the interrupt flag and the counters are shared.
pub struct BatchRunner {
    config: Arc<ScrapeConfig>,
    mode: AcquisitionMode,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    interrupt: Interrupt,
    semaphore: Arc<Semaphore>,
    stats: Arc<BatchStats>,
    write_report: bool,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("mode", &self.mode)
            .field("concurrency", &self.config.concurrency)
            .finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Creates a runner using `config.concurrency` workers.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] when the concurrency is
    /// outside `1..=16`.
    pub fn new(config: ScrapeConfig, mode: AcquisitionMode) -> Result<Self, BatchError> {
        let concurrency = config.concurrency;
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(BatchError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            config: Arc::new(config),
            mode,
            launcher: None,
            interrupt: Interrupt::new(),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            stats: Arc::new(BatchStats::default()),
            write_report: true,
        })
    }

    /// Browser launcher for dynamic mode.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Shared interrupt flag.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Enables or disables per-URL text reports.
    #[must_use]
    pub fn with_report(mut self, enabled: bool) -> Self {
        self.write_report = enabled;
        self
    }

    /// Live counters, for progress display.
    #[must_use]
    pub fn stats(&self) -> Arc<BatchStats> {
        Arc::clone(&self.stats)
    }

    /// Scrapes every URL and returns the results in input order.
    ///
    /// Once the interrupt flag is raised, URLs that have not started are
    /// reported as [`PipelineError::Interrupted`].
    #[instrument(skip(self, urls), fields(count = urls.len(), mode = %self.mode))]
    pub async fn run(&self, urls: &[String]) -> Vec<BatchItem> {
        let multi = urls.len() > 1;
        let mut handles = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                warn!("batch semaphore closed");
                break;
            };

            let config = Arc::clone(&self.config);
            let launcher = self.launcher.clone();
            let interrupt = self.interrupt.clone();
            let stats = Arc::clone(&self.stats);
            let mode = self.mode;
            let write_report = self.write_report;
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = if interrupt.is_triggered() {
                    Err(PipelineError::Interrupted(url.clone()))
                } else {
                    run_one(&config, mode, launcher, &interrupt, write_report, multi.then_some(index), &url).await
                };
                stats.record(result.is_ok());
                BatchItem { index, url, result }
            }));
        }

        debug!(tasks = handles.len(), "waiting for scrape tasks");
        let mut items = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(item) => items.push(item),
                Err(error) => {
                    warn!(%error, "scrape task panicked");
                    items.push(BatchItem {
                        index,
                        url: urls[index].clone(),
                        result: Err(PipelineError::Setup(format!("task failed: {error}"))),
                    });
                }
            }
        }

        info!(
            succeeded = self.stats.succeeded(),
            failed = self.stats.failed(),
            "batch finished"
        );
        items
    }
}

async fn run_one(
    config: &ScrapeConfig,
    mode: AcquisitionMode,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    interrupt: &Interrupt,
    write_report: bool,
    source_index: Option<usize>,
    url: &str,
) -> Result<ScrapeOutcome, PipelineError> {
    let mut pipeline = Pipeline::from_config(config, mode, launcher, interrupt)?.with_report(write_report);
    if let Some(n) = source_index
        && let Some(exporter) = pipeline.exporter_mut()
    {
        *exporter = exporter.for_source(n);
    }
    pipeline.run(url).await
}
