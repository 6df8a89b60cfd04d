//! Integration tests for extraction and normalization on realistic pages.

use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use disclosure_scraper::normalize::{
    extract_financial_records, filter_tables_by_header, merge_snapshots, validate,
};
use disclosure_scraper::{PageSnapshot, extract, extract_at};
use rust_decimal::Decimal;

const DISCLOSURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title> 理财产品净值公告 </title>
  <meta name="keywords" content="净值,理财">
  <meta property="og:site_name" content="Example Bank">
  <script>window.__state = {"rows": 3};</script>
</head>
<body>
  <div class="banner">产品净值披露</div>
  <h2>产品概况</h2>
  <p>产品代码：A0001</p>
  <h2>历史净值</h2>
  <table class="net-value-table">
    <thead><tr><th>日期</th><th>净值</th><th>累计净值</th><th>日增长率</th></tr></thead>
    <tbody>
      <tr><td>2026-02-12</td><td>1.2345</td><td>1.5678</td><td>0.12%</td></tr>
      <tr><td>2026/02/11</td><td>1.2330</td><td>1.5663</td><td>-0.05%</td></tr>
      <tr><td>暂无</td><td>--</td><td>--</td><td>--</td></tr>
    </tbody>
  </table>
  <table><tr><td>风险等级</td><td>R2</td></tr></table>
</body>
</html>"#;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal")
}

#[test]
fn test_single_row_scenario_yields_one_record() {
    let html = "<table><tr><th>日期</th><th>净值</th><th>累计净值</th><th>日增长率</th></tr>\
                <tr><td>2026-02-12</td><td>1.2345</td><td>1.5678</td><td>0.12%</td></tr></table>";

    let snapshot = extract(html, "https://bank.example/nav");
    let extraction = extract_financial_records(&snapshot);

    assert_eq!(extraction.records.len(), 1);
    let record = &extraction.records[0];
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
    assert_eq!(record.net_value, Some(dec("1.2345")));
    assert_eq!(record.cumulative_net_value, Some(dec("1.5678")));
    assert_eq!(record.daily_growth_rate, Some(dec("0.0012")));
}

#[test]
fn test_disclosure_page_end_to_end() {
    let at = Utc.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap();
    let snapshot = extract_at(DISCLOSURE_PAGE, "https://bank.example/nav?prodId=A0001&lang=zh", at);

    assert_eq!(snapshot.page_title.as_deref(), Some("理财产品净值公告"));
    assert_eq!(snapshot.tables.len(), 2);
    assert_eq!(snapshot.metadata["og:site_name"], "Example Bank");
    assert_eq!(snapshot.url_parameters["prodId"], "A0001");

    let headings: Vec<&str> = snapshot
        .content_sections
        .iter()
        .map(|s| s.heading.as_str())
        .collect();
    assert_eq!(headings, vec!["", "产品概况", "历史净值"]);
    assert_eq!(snapshot.content_sections[0].text, "产品净值披露");
    assert!(!snapshot.content_sections.iter().any(|s| s.text.contains("__state")));

    let validation = validate(&snapshot);
    assert!(validation.is_valid, "{:?}", validation.issues);

    let extraction = extract_financial_records(&snapshot);
    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.records[1].daily_growth_rate, Some(dec("-0.0005")));
    assert_eq!(extraction.dropped.len(), 1);
    assert_eq!(extraction.dropped[0].row_index, 2);

    assert_eq!(filter_tables_by_header(&snapshot, "累计").len(), 1);
}

#[test]
fn test_extract_n_tables_in_order_and_idempotent() {
    let html: String = (0..5)
        .map(|i| format!("<section><table><tr><td>t{i}</td></tr></table></section>"))
        .collect();
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    let first = extract_at(&html, "https://bank.example/", at);
    let second = extract_at(&html, "https://bank.example/", at);

    assert_eq!(first.tables.len(), 5);
    for (i, table) in first.tables.iter().enumerate() {
        assert_eq!(table.index, i);
        assert_eq!(table.rows[0][0], format!("t{i}"));
    }
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_snapshot_json_round_trip_preserves_document() {
    let at = Utc.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap();
    let snapshot = extract_at(DISCLOSURE_PAGE, "https://bank.example/nav", at);

    let json = snapshot.to_json().unwrap();
    let parsed: PageSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, snapshot);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tables"][0]["headers"][2], "累计净值");
}

#[test]
fn test_validation_flags_ragged_rows_only_against_headers() {
    let html = "<table><tr><th>日期</th><th>净值</th></tr>\
                <tr><td>2026-02-12</td><td>1.0</td></tr>\
                <tr><td>2026-02-11</td></tr></table>";
    let report = validate(&extract(html, "https://bank.example/"));
    assert!(!report.is_valid);
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].contains("table 0"));
}

#[test]
fn test_merge_metadata_last_write_wins_in_input_order() {
    let first = extract(r#"<meta name="a" content="1">"#, "https://bank.example/1");
    let second = extract(
        r#"<meta name="a" content="2"><meta name="b" content="3">"#,
        "https://bank.example/2",
    );

    let merged = merge_snapshots(&[first, second]);

    assert_eq!(merged.metadata.len(), 2);
    assert_eq!(merged.metadata["a"], "2");
    assert_eq!(merged.metadata["b"], "3");
    assert_eq!(merged.sources[1].url, "https://bank.example/2");
}
