//! Snapshot merging and header filtering.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{PageSnapshot, Section, Table};

/// Identity of one merged snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Page URL.
    pub url: String,
    /// Capture time.
    pub scraped_at: DateTime<Utc>,
    /// Page title, if any.
    pub page_title: Option<String>,
}

/// A table together with the position of the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedTable {
    /// Index into [`AggregatedResult::sources`].
    pub source: usize,
    /// The table itself.
    #[serde(flatten)]
    pub table: Table,
}

/// Several snapshots folded into one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Input snapshots in order.
    pub sources: Vec<SourceInfo>,
    /// All tables in input order.
    pub tables: Vec<SourcedTable>,
    /// Metadata; later snapshots overwrite earlier keys.
    pub metadata: BTreeMap<String, String>,
    /// All sections in input order.
    pub content_sections: Vec<Section>,
    /// URL parameters; later snapshots overwrite earlier keys.
    pub url_parameters: BTreeMap<String, String>,
}

/// Merges snapshots in input order.
#[must_use]
pub fn merge_snapshots(snapshots: &[PageSnapshot]) -> AggregatedResult {
    let mut merged = AggregatedResult::default();
    for (source, snapshot) in snapshots.iter().enumerate() {
        merged.sources.push(SourceInfo {
            url: snapshot.source_url.clone(),
            scraped_at: snapshot.fetched_at,
            page_title: snapshot.page_title.clone(),
        });
        merged
            .tables
            .extend(snapshot.tables.iter().cloned().map(|table| SourcedTable { source, table }));
        merged
            .content_sections
            .extend(snapshot.content_sections.iter().cloned());
        merged.metadata.extend(snapshot.metadata.clone());
        merged.url_parameters.extend(snapshot.url_parameters.clone());
    }
    merged
}

/// Tables with at least one header containing `term`, case-insensitively.
#[must_use]
pub fn filter_tables_by_header<'a>(snapshot: &'a PageSnapshot, term: &str) -> Vec<&'a Table> {
    let term = term.to_lowercase();
    snapshot
        .tables
        .iter()
        .filter(|t| t.headers.iter().any(|h| h.to_lowercase().contains(&term)))
        .collect()
}
