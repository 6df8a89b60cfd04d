//! Directory-scoped writer for snapshots, aggregates and reports.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::extract::PageSnapshot;
use crate::normalize::{AggregatedResult, RecordExtraction, ValidationReport};
use super::atomic::write_atomic;
use super::csv_out;
use super::error::ExportError;
use super::report::render_report;

/// Default file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "net_value";

/// Paths written by [`Exporter::write_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportPaths {
    /// The JSON document.
    pub json: PathBuf,
    /// One CSV per table, in table order.
    pub tables: Vec<PathBuf>,
    /// Records CSV, absent when no records were extracted.
    pub records: Option<PathBuf>,
}

impl ExportPaths {
    /// Every path in write order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.json.as_path())
            .chain(self.tables.iter().map(PathBuf::as_path))
            .chain(self.records.as_deref())
    }
}

/// Writes snapshots, aggregates and reports into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exporter {
    output_dir: PathBuf,
    prefix: String,
}

impl Exporter {
    /// Creates an exporter; the directory is created on first write.
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Exporter for the `n`-th source of a batch, so names never collide.
    #[must_use]
    pub fn for_source(&self, n: usize) -> Self {
        Self {
            output_dir: self.output_dir.clone(),
            prefix: format!("{}_{n}", self.prefix),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the JSON document, one CSV per table and the records CSV.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on the first file that cannot be written.
    #[instrument(skip_all, fields(url = %snapshot.source_url, dir = %self.output_dir.display()))]
    pub async fn write_snapshot(
        &self,
        snapshot: &PageSnapshot,
        records: &RecordExtraction,
    ) -> Result<ExportPaths, ExportError> {
        self.ensure_dir().await?;
        let stamp = timestamp(snapshot.fetched_at);

        let json = self.path(&format!("{}_{stamp}.json", self.prefix));
        write_atomic(&json, snapshot.to_json()?.as_bytes()).await?;

        let mut tables = Vec::with_capacity(snapshot.tables.len());
        for table in &snapshot.tables {
            let path = self.path(&format!("{}_table_{}_{stamp}.csv", self.prefix, table.index));
            write_atomic(&path, &csv_out::table_to_csv(table)?).await?;
            tables.push(path);
        }

        let records_path = if records.records.is_empty() {
            None
        } else {
            let path = self.path(&format!("{}_records_{stamp}.csv", self.prefix));
            write_atomic(&path, &csv_out::records_to_csv(&records.records)?).await?;
            Some(path)
        };

        info!(
            tables = tables.len(),
            records = records.records.len(),
            "snapshot exported"
        );
        Ok(ExportPaths {
            json,
            tables,
            records: records_path,
        })
    }

    /// Writes the merged JSON document of a batch.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if serialization or the write fails.
    pub async fn write_aggregate(
        &self,
        aggregate: &AggregatedResult,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, ExportError> {
        self.ensure_dir().await?;
        let path = self.path(&format!("{}_merged_{}.json", self.prefix, timestamp(at)));
        write_atomic(&path, serde_json::to_string_pretty(aggregate)?.as_bytes()).await?;
        info!(path = %path.display(), sources = aggregate.sources.len(), "aggregate exported");
        Ok(path)
    }

    /// Writes the text report for one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the write fails.
    pub async fn write_report(
        &self,
        snapshot: &PageSnapshot,
        validation: &ValidationReport,
        records: &RecordExtraction,
    ) -> Result<PathBuf, ExportError> {
        self.ensure_dir().await?;
        let stamp = timestamp(snapshot.fetched_at);
        let path = self.path(&format!("{}_report_{stamp}.txt", self.prefix));
        write_atomic(&path, render_report(snapshot, validation, records).as_bytes()).await?;
        Ok(path)
    }

    async fn ensure_dir(&self) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::io(&self.output_dir, e))
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
