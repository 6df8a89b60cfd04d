//! One scrape run: acquire markup, extract, normalize, export.
//!
//! ```text
//! static:  Fetcher ------\
//!                         +--> extract --> validate / records --> export
//! dynamic: DynamicLoader -/
//! ```
//!
//! Dynamic runs may capture several pages of one listing; they are folded
//! into a single snapshot, and pages without a table fall back to their list
//! items.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ScrapeConfig;
use crate::export::{ExportError, ExportPaths, Exporter};
use crate::extract::{self, PageSnapshot};
use crate::fetch::{FetchError, FetchResult, Fetcher};
use crate::interrupt::Interrupt;
use crate::normalize::{self, RecordExtraction, ValidationReport};
use crate::render::{BrowserLauncher, DynamicLoader, LoadError};

/// How markup is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionMode {
    /// Plain HTTP fetch with retries.
    #[default]
    Static,
    /// Headless browser with a scroll loop.
    Dynamic,
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Why a run produced no outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The static fetch did not succeed.
    #[error("fetch of {} failed: {} after {} attempt(s){}", .0.url, .0.status, .0.attempts, last_error_suffix(.0))]
    Fetch(Box<FetchResult>),

    /// The dynamic load did not succeed.
    #[error("dynamic load failed: {0}")]
    Load(#[from] LoadError),

    /// Strict validation rejected the snapshot.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Output could not be written.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    /// The pipeline could not be assembled.
    #[error("pipeline setup failed: {0}")]
    Setup(String),

    /// The run was cancelled before it started.
    #[error("interrupted before {0} was scraped")]
    Interrupted(String),
}

fn last_error_suffix(result: &FetchResult) -> String {
    result
        .last_error
        .as_deref()
        .map(|e| format!(" ({e})"))
        .unwrap_or_default()
}

impl From<FetchError> for PipelineError {
    fn from(error: FetchError) -> Self {
        Self::Setup(error.to_string())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// Extracted page.
    pub snapshot: PageSnapshot,
    /// Shape check of `snapshot`.
    pub validation: ValidationReport,
    /// Net-value records and dropped rows.
    pub records: RecordExtraction,
    /// Files written, when exporting was enabled.
    pub exported: Option<ExportPaths>,
    /// Report file, when enabled.
    pub report: Option<PathBuf>,
}

enum MarkupSource {
    Fetch(Fetcher),
    Load(DynamicLoader),
}

/// Composes one acquisition strategy with extraction, normalization and export.
pub struct Pipeline {
    source: MarkupSource,
    exporter: Option<Exporter>,
    write_report: bool,
    strict_validation: bool,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.source {
            MarkupSource::Fetch(_) => AcquisitionMode::Static,
            MarkupSource::Load(_) => AcquisitionMode::Dynamic,
        };
        f.debug_struct("Pipeline")
            .field("mode", &mode)
            .field("exporter", &self.exporter)
            .field("write_report", &self.write_report)
            .field("strict_validation", &self.strict_validation)
            .finish()
    }
}

impl Pipeline {
    /// Static pipeline over an existing fetcher.
    #[must_use]
    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self::from_source(MarkupSource::Fetch(fetcher))
    }

    /// Dynamic pipeline over an existing loader.
    #[must_use]
    pub fn with_loader(loader: DynamicLoader) -> Self {
        Self::from_source(MarkupSource::Load(loader))
    }

    fn from_source(source: MarkupSource) -> Self {
        Self {
            source,
            exporter: None,
            write_report: false,
            strict_validation: false,
        }
    }

    /// Builds a pipeline from configuration.
    ///
    /// Export and strictness follow `config`; the report is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Setup`] when the HTTP client cannot be built
    /// or dynamic mode is requested without a browser launcher.
    pub fn from_config(
        config: &ScrapeConfig,
        mode: AcquisitionMode,
        launcher: Option<Arc<dyn BrowserLauncher>>,
        interrupt: &Interrupt,
    ) -> Result<Self, PipelineError> {
        let pipeline = match mode {
            AcquisitionMode::Static => {
                let fetcher = Fetcher::new(&config.fetch_config())?.with_interrupt(interrupt.clone());
                Self::with_fetcher(fetcher)
            }
            AcquisitionMode::Dynamic => {
                let launcher = launcher.ok_or_else(|| {
                    PipelineError::Setup(
                        "dynamic mode needs a browser; rebuild with `--features browser`".to_string(),
                    )
                })?;
                let loader = DynamicLoader::new(launcher, config.loader_config())
                    .with_interrupt(interrupt.clone());
                Self::with_loader(loader)
            }
        };
        Ok(pipeline
            .with_exporter(Exporter::new(&config.output_dir, config.file_prefix.clone()))
            .with_report(true)
            .with_strict_validation(config.strict_validation))
    }

    /// Writes output files through `exporter` after each successful run.
    #[must_use]
    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Skips writing output files.
    #[must_use]
    pub fn without_export(mut self) -> Self {
        self.exporter = None;
        self
    }

    /// Also writes the text report (needs an exporter).
    #[must_use]
    pub fn with_report(mut self, enabled: bool) -> Self {
        self.write_report = enabled;
        self
    }

    /// Fails the run when validation reports any issue.
    #[must_use]
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    /// Mutable access to the exporter, for per-source naming in batches.
    pub(crate) fn exporter_mut(&mut self) -> Option<&mut Exporter> {
        self.exporter.as_mut()
    }

    /// Scrapes `url` end to end.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fetch`] or [`PipelineError::Load`] when no
    /// markup was obtained, [`PipelineError::Validation`] in strict mode, and
    /// [`PipelineError::Export`] when writing fails.
    #[instrument(skip(self))]
    pub async fn run(&self, url: &str) -> Result<ScrapeOutcome, PipelineError> {
        let acquired = self.acquire(url).await?;
        let (snapshot, validation, records) = analyze(&acquired, url);

        if !validation.is_valid {
            for issue in &validation.issues {
                warn!(%issue, "validation issue");
            }
            if self.strict_validation {
                return Err(PipelineError::Validation(validation.issues));
            }
        }

        let (exported, report) = match &self.exporter {
            Some(exporter) => {
                let paths = exporter.write_snapshot(&snapshot, &records).await?;
                let report = if self.write_report {
                    Some(exporter.write_report(&snapshot, &validation, &records).await?)
                } else {
                    None
                };
                (Some(paths), report)
            }
            None => (None, None),
        };

        info!(
            tables = snapshot.tables.len(),
            rows = snapshot.row_count(),
            records = records.records.len(),
            valid = validation.is_valid,
            "scrape finished"
        );
        Ok(ScrapeOutcome {
            snapshot,
            validation,
            records,
            exported,
            report,
        })
    }

    async fn acquire(&self, url: &str) -> Result<Acquired, PipelineError> {
        match &self.source {
            MarkupSource::Fetch(fetcher) => {
                let result = fetcher.fetch(url).await;
                match result.body {
                    Some(body) if result.is_success() => Ok(Acquired {
                        pages: vec![body],
                        list_fallback: false,
                    }),
                    _ => Err(PipelineError::Fetch(Box::new(result))),
                }
            }
            MarkupSource::Load(loader) => Ok(Acquired {
                pages: loader.load(url).await?.pages,
                list_fallback: true,
            }),
        }
    }
}

/// Markup obtained for one URL.
struct Acquired {
    pages: Vec<String>,
    list_fallback: bool,
}

/// Extracts and normalizes markup synchronously.
fn analyze(acquired: &Acquired, url: &str) -> (PageSnapshot, ValidationReport, RecordExtraction) {
    let snapshot = extract::extract_pages_at(&acquired.pages, url, Utc::now(), acquired.list_fallback);
    let validation = normalize::validate(&snapshot);
    let records = normalize::extract_financial_records(&snapshot);
    (snapshot, validation, records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::{FetchStatus, RetryPolicy, Transport};

    struct FixedTransport(Mutex<Vec<Result<String, FetchError>>>);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            let mut script = self.0.lock().unwrap();
            if script.is_empty() {
                Err(FetchError::connection(url, "script exhausted"))
            } else {
                script.remove(0)
            }
        }
    }

    fn pipeline(script: Vec<Result<String, FetchError>>) -> Pipeline {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1), Duration::ZERO);
        Pipeline::with_fetcher(Fetcher::with_transport(
            Box::new(FixedTransport(Mutex::new(script))),
            policy,
        ))
    }

    const NAV_PAGE: &str = "<table><tr><th>日期</th><th>净值</th><th>累计净值</th><th>日增长率</th></tr>\
                            <tr><td>2026-02-12</td><td>1.2345</td><td>1.5678</td><td>0.12%</td></tr></table>";

    #[tokio::test]
    async fn test_run_static_without_export() {
        let outcome = pipeline(vec![Ok(NAV_PAGE.to_string())])
            .run("https://bank.example/nav?prodId=1")
            .await
            .unwrap();

        assert_eq!(outcome.snapshot.tables.len(), 1);
        assert!(outcome.validation.is_valid);
        assert_eq!(outcome.records.records.len(), 1);
        assert!(outcome.exported.is_none());
        assert!(outcome.report.is_none());
    }

    #[tokio::test]
    async fn test_run_fetch_failure_carries_fetch_result() {
        let error = pipeline(vec![Err(FetchError::http_status("u", 404))])
            .run("https://bank.example/missing")
            .await
            .unwrap_err();

        let PipelineError::Fetch(result) = &error else {
            panic!("expected fetch error, got {error:?}");
        };
        assert_eq!(result.status, FetchStatus::HttpError(404));
        assert_eq!(result.attempts, 1);
        assert!(error.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_strict_validation_rejects_page_without_tables() {
        let error = pipeline(vec![Ok("<p>维护中</p>".to_string())])
            .with_strict_validation(true)
            .run("https://bank.example/nav")
            .await
            .unwrap_err();

        assert!(matches!(error, PipelineError::Validation(ref issues) if issues == &["no tables found"]));
    }

    #[tokio::test]
    async fn test_lenient_validation_still_returns_outcome() {
        let outcome = pipeline(vec![Ok("<p>维护中</p>".to_string())])
            .run("https://bank.example/nav")
            .await
            .unwrap();
        assert!(!outcome.validation.is_valid);
    }

    #[tokio::test]
    async fn test_run_exports_files_and_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let outcome = pipeline(vec![Ok(NAV_PAGE.to_string())])
            .with_exporter(Exporter::new(dir.path(), "nav"))
            .with_report(true)
            .run("https://bank.example/nav")
            .await
            .unwrap();

        let paths = outcome.exported.unwrap();
        assert!(paths.json.exists());
        assert_eq!(paths.tables.len(), 1);
        assert!(paths.records.unwrap().exists());
        assert!(outcome.report.unwrap().exists());
    }

    #[test]
    fn test_dynamic_without_launcher_is_setup_error() {
        let error = Pipeline::from_config(
            &ScrapeConfig::default(),
            AcquisitionMode::Dynamic,
            None,
            &Interrupt::new(),
        )
        .unwrap_err();
        assert!(matches!(error, PipelineError::Setup(ref m) if m.contains("browser")));
    }
}
