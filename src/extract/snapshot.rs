//! Page snapshot value types and their JSON shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `<table>` element.
///
/// Rows keep their own length even when it disagrees with `headers`;
/// mismatches are reported by validation, never repaired here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Position among all `<table>` elements in document order.
    pub index: usize,
    /// Header cells, empty when the table has no header row.
    pub headers: Vec<String>,
    /// Body rows.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Width used for shape checks: the header count, or the first row's length.
    #[must_use]
    pub fn expected_width(&self) -> Option<usize> {
        if self.headers.is_empty() {
            self.rows.first().map(Vec::len)
        } else {
            Some(self.headers.len())
        }
    }
}

/// A heading and the text that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text, empty for the leading or heading-less section.
    pub heading: String,
    /// Collapsed body text.
    pub text: String,
}

/// Everything extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// When the markup was captured.
    #[serde(rename = "scraped_at")]
    pub fetched_at: DateTime<Utc>,
    /// The page URL.
    #[serde(rename = "url")]
    pub source_url: String,
    /// `<title>` text.
    pub page_title: Option<String>,
    /// Tables in document order.
    pub tables: Vec<Table>,
    /// Content sections in document order.
    pub content_sections: Vec<Section>,
    /// `<meta>` name/property to content; the last tag wins.
    pub metadata: BTreeMap<String, String>,
    /// Query parameters of `source_url`; the last occurrence wins.
    pub url_parameters: BTreeMap<String, String>,
}

impl PageSnapshot {
    /// Serializes to the pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; this cannot happen for well-formed snapshots.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Total number of body rows across all tables.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}
