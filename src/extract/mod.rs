//! Structural extraction of disclosure pages.
//!
//! Turns raw markup into a [`PageSnapshot`]: tables in document order, the
//! page title, `<meta>` tags, heading-grouped content sections and the query
//! parameters of the source URL. Extraction is pure; the same markup, URL and
//! timestamp always produce the same snapshot.
//!
//! Rendered listings may span several pages; [`extract_pages_at`] folds them
//! into one snapshot and can fall back to list layouts when a page has no
//! table.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use disclosure_scraper::extract::extract_at;
//!
//! let html = "<table><tr><th>日期</th><th>净值</th></tr>\
//!             <tr><td>2026-02-12</td><td>1.0235</td></tr></table>";
//! let snapshot = extract_at(html, "https://bank.example/nav?prodId=7", Utc::now());
//! assert_eq!(snapshot.tables[0].headers, vec!["日期", "净值"]);
//! assert_eq!(snapshot.url_parameters["prodId"], "7");
//! ```

mod dom;
mod lists;
mod page;
mod sections;
mod snapshot;
mod tables;

pub use snapshot::{PageSnapshot, Section, Table};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;

/// Extracts a snapshot stamped with the current time.
#[must_use]
pub fn extract(markup: &str, source_url: &str) -> PageSnapshot {
    extract_at(markup, source_url, Utc::now())
}

/// Extracts a snapshot with an explicit capture time.
#[must_use]
pub fn extract_at(markup: &str, source_url: &str, fetched_at: DateTime<Utc>) -> PageSnapshot {
    extract_pages_at(&[markup], source_url, fetched_at, false)
}

/// Extracts one snapshot from the consecutive pages of a listing.
///
/// Title, metadata and sections come from the first page. Tables of later
/// pages are appended, their `index` continuing after the table slots of the
/// pages before them. With `list_fallback`, a page without any table
/// contributes one headerless table built from its list items.
#[must_use]
pub fn extract_pages_at<S: AsRef<str>>(
    pages: &[S],
    source_url: &str,
    fetched_at: DateTime<Utc>,
    list_fallback: bool,
) -> PageSnapshot {
    let mut snapshot = PageSnapshot {
        fetched_at,
        source_url: source_url.to_string(),
        page_title: None,
        tables: Vec::new(),
        content_sections: Vec::new(),
        metadata: BTreeMap::new(),
        url_parameters: page::extract_url_parameters(source_url),
    };

    let mut offset = 0;
    for (number, markup) in pages.iter().enumerate() {
        let document = Html::parse_document(markup.as_ref());
        if number == 0 {
            snapshot.page_title = page::extract_title(&document);
            snapshot.content_sections = sections::extract_sections(&document);
            snapshot.metadata = page::extract_metadata(&document);
        }

        let slots = tables::table_slots(&document);
        let before = snapshot.tables.len();
        snapshot
            .tables
            .extend(tables::extract_tables(&document).into_iter().map(|mut table| {
                table.index += offset;
                table
            }));
        offset += slots;

        if list_fallback
            && snapshot.tables.len() == before
            && let Some(table) = lists::extract_list_table(&document, offset)
        {
            snapshot.tables.push(table);
            offset += 1;
        }
    }

    debug!(
        url = source_url,
        pages = pages.len(),
        tables = snapshot.tables.len(),
        sections = snapshot.content_sections.len(),
        metadata = snapshot.metadata.len(),
        "page extracted"
    );
    snapshot
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>理财产品净值</title>
<meta name="description" content="净值披露"></head>
<body>
<h1>产品净值</h1>
<table class="net-value-table">
  <thead><tr><th>日期</th><th>净值</th></tr></thead>
  <tbody>
    <tr><td>2026-02-12</td><td>1.0235</td></tr>
    <tr><td>2026-02-11</td><td>1.0221</td></tr>
  </tbody>
</table>
<table><tr><td>备注</td></tr></table>
</body></html>"#;

    #[test]
    fn test_extract_full_page() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let snapshot = extract_at(PAGE, "https://bank.example/nav?prodId=P1", at);

        assert_eq!(snapshot.page_title.as_deref(), Some("理财产品净值"));
        assert_eq!(snapshot.tables.len(), 2);
        assert_eq!(snapshot.tables[0].rows.len(), 2);
        assert_eq!(snapshot.metadata["description"], "净值披露");
        assert_eq!(snapshot.url_parameters["prodId"], "P1");
        assert_eq!(snapshot.content_sections[0].heading, "产品净值");
        assert!(snapshot.content_sections[0].text.contains("1.0235"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let first = extract_at(PAGE, "https://bank.example/nav", at);
        let second = extract_at(PAGE, "https://bank.example/nav", at);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    // ==================== Multi-Page Tests ====================

    #[test]
    fn test_extract_pages_appends_tables_with_continuing_index() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let second = "<html><head><title>第二页</title></head><body>\
                      <table></table>\
                      <table><tr><th>日期</th><th>净值</th></tr>\
                      <tr><td>2026-02-10</td><td>1.0200</td></tr></table></body></html>";

        let snapshot = extract_pages_at(&[PAGE, second], "https://bank.example/nav", at, false);

        assert_eq!(snapshot.page_title.as_deref(), Some("理财产品净值"));
        let indexes: Vec<usize> = snapshot.tables.iter().map(|t| t.index).collect();
        assert_eq!(indexes, vec![0, 1, 3]);
        assert_eq!(snapshot.tables[2].rows[0][0], "2026-02-10");
    }

    #[test]
    fn test_extract_pages_list_fallback_only_when_enabled() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let list = r#"<div class="netvalue-list">
            <div class="item"><span>2026-02-12</span><span>1.0235</span></div>
            <div class="item"><span>2026-02-11</span><span>1.0221</span></div></div>"#;

        let without = extract_pages_at(&[list], "https://bank.example/nav", at, false);
        assert!(without.tables.is_empty());

        let with = extract_pages_at(&[list], "https://bank.example/nav", at, true);
        assert_eq!(with.tables.len(), 1);
        assert_eq!(with.tables[0].rows[1], vec!["2026-02-11", "1.0221"]);
    }

    #[test]
    fn test_extract_pages_list_fallback_skips_pages_with_tables() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let snapshot = extract_pages_at(&[PAGE], "https://bank.example/nav", at, true);
        assert_eq!(snapshot, extract_at(PAGE, "https://bank.example/nav", at));
    }

    #[test]
    fn test_extract_no_pages_yields_empty_snapshot() {
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap();
        let snapshot = extract_pages_at::<&str>(&[], "https://bank.example/nav?a=1", at, true);
        assert!(snapshot.tables.is_empty());
        assert_eq!(snapshot.url_parameters["a"], "1");
    }

    #[test]
    fn test_extract_empty_markup() {
        let snapshot = extract("", "https://bank.example/");
        assert!(snapshot.tables.is_empty());
        assert!(snapshot.page_title.is_none());
        assert!(snapshot.metadata.is_empty());
    }
}
