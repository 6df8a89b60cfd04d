//! Plain-text run report.

use std::fmt::Write as _;

use chrono::SecondsFormat;

use crate::extract::PageSnapshot;
use crate::normalize::{RecordExtraction, ValidationReport};

const RULE_WIDTH: usize = 80;
const MAX_LISTED_COLUMNS: usize = 5;

/// Renders a human-readable summary of one scrape.
#[must_use]
pub fn render_report(
    snapshot: &PageSnapshot,
    validation: &ValidationReport,
    records: &RecordExtraction,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{rule}\nNet-Value Disclosure Scraping Report\n{rule}\n");
    let _ = writeln!(
        out,
        "Scraped at: {}",
        snapshot.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(out, "Source URL: {}", snapshot.source_url);
    let _ = writeln!(
        out,
        "Page Title: {}\n",
        snapshot.page_title.as_deref().unwrap_or("(none)")
    );

    let _ = writeln!(out, "URL Parameters:");
    for (key, value) in &snapshot.url_parameters {
        let _ = writeln!(out, "  {key}: {value}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Tables Extracted: {}", snapshot.tables.len());
    for table in &snapshot.tables {
        let _ = writeln!(
            out,
            "  Table {}: {} columns, {} rows",
            table.index,
            table.headers.len(),
            table.rows.len()
        );
        if !table.headers.is_empty() {
            let shown = table.headers.len().min(MAX_LISTED_COLUMNS);
            let _ = writeln!(out, "    Columns: {}", table.headers[..shown].join(", "));
            if table.headers.len() > MAX_LISTED_COLUMNS {
                let _ = writeln!(
                    out,
                    "             ... ({} more)",
                    table.headers.len() - MAX_LISTED_COLUMNS
                );
            }
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Content Sections: {}", snapshot.content_sections.len());
    let _ = writeln!(out, "Metadata Fields: {}\n", snapshot.metadata.len());

    if validation.is_valid {
        let _ = writeln!(out, "Validation: OK");
    } else {
        let _ = writeln!(out, "Validation: {} issue(s)", validation.issues.len());
        for issue in &validation.issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }

    let _ = writeln!(out, "Net-Value Records: {}", records.records.len());
    if !records.dropped.is_empty() {
        let _ = writeln!(out, "Dropped Rows: {}", records.dropped.len());
        for dropped in &records.dropped {
            let _ = writeln!(
                out,
                "  - table {} row {}: {}",
                dropped.table_index, dropped.row_index, dropped.reason
            );
        }
    }
    let _ = write!(out, "\n{rule}\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::extract::extract_at;
    use crate::normalize::{DroppedRow, extract_financial_records, validate};

    #[test]
    fn test_report_summarizes_snapshot() {
        let html = "<title>净值</title><table><tr><th>a</th><th>b</th><th>c</th>\
                    <th>d</th><th>e</th><th>f</th><th>g</th></tr><tr><td>1</td></tr></table>";
        let at = Utc.with_ymd_and_hms(2026, 2, 12, 9, 0, 0).unwrap();
        let snapshot = extract_at(html, "https://bank.example/nav?prodId=9", at);
        let validation = validate(&snapshot);
        let records = extract_financial_records(&snapshot);

        let report = render_report(&snapshot, &validation, &records);

        assert!(report.contains("Scraped at: 2026-02-12T09:00:00Z"));
        assert!(report.contains("Page Title: 净值"));
        assert!(report.contains("  prodId: 9"));
        assert!(report.contains("Table 0: 7 columns, 1 rows"));
        assert!(report.contains("Columns: a, b, c, d, e\n"));
        assert!(report.contains("... (2 more)"));
        assert!(report.contains("Validation: 1 issue(s)"));
        assert!(report.contains("Net-Value Records: 0"));
    }

    #[test]
    fn test_report_lists_dropped_rows() {
        let snapshot = extract_at("", "https://bank.example/", Utc::now());
        let records = RecordExtraction {
            records: vec![],
            dropped: vec![DroppedRow {
                table_index: 2,
                row_index: 5,
                reason: "unparseable date \"--\"".to_string(),
            }],
        };
        let report = render_report(&snapshot, &validate(&snapshot), &records);
        assert!(report.contains("Dropped Rows: 1"));
        assert!(report.contains("table 2 row 5"));
        assert!(report.contains("Page Title: (none)"));
    }
}
