//! Net-value record extraction from generic tables.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::columns::ColumnMap;
use super::numeric::clean_numeric;
use crate::extract::{PageSnapshot, Table};

/// `2026-02-12`, `2026/2/12`, `2026.02.12`, `2026年02月12日`, with an optional time suffix.
#[allow(clippy::expect_used)]
static SEPARATED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})\s*日?(?:\s.*)?$")
        .expect("date regex is valid") // Static pattern, safe to panic
});

/// `20260212`
#[allow(clippy::expect_used)]
static COMPACT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("compact date regex is valid") // Static pattern, safe to panic
});

/// One net-value observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Valuation date.
    pub date: NaiveDate,
    /// Unit net value.
    pub net_value: Option<Decimal>,
    /// Cumulative unit net value.
    pub cumulative_net_value: Option<Decimal>,
    /// Day-over-day growth as a fraction (`0.0012` for `0.12%`).
    pub daily_growth_rate: Option<Decimal>,
    /// Source table index.
    pub table_index: usize,
    /// Row position within the source table body.
    pub row_index: usize,
}

/// A row that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Source table index.
    pub table_index: usize,
    /// Row position within the source table body.
    pub row_index: usize,
    /// Why the row was dropped.
    pub reason: String,
}

/// Records plus the rows that were dropped on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordExtraction {
    /// Parsed records in table, then row order.
    pub records: Vec<NormalizedRecord>,
    /// Rows without a usable date.
    pub dropped: Vec<DroppedRow>,
}

/// Parses a date cell in any of the layouts disclosure pages use.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let captures = SEPARATED_DATE
        .captures(text)
        .or_else(|| COMPACT_DATE.captures(text))?;
    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let day = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Turns every recognizable net-value table into records.
///
/// Tables whose headers do not name a date column plus at least one value
/// column are skipped silently.
#[must_use]
pub fn extract_financial_records(snapshot: &PageSnapshot) -> RecordExtraction {
    let mut extraction = RecordExtraction::default();
    for table in &snapshot.tables {
        let columns = ColumnMap::from_headers(&table.headers);
        if !columns.is_usable() {
            debug!(table = table.index, "no net-value columns recognized");
            continue;
        }
        records_from_table(table, columns, &mut extraction);
    }
    extraction
}

fn records_from_table(table: &Table, columns: ColumnMap, out: &mut RecordExtraction) {
    let Some(date_column) = columns.date else {
        return;
    };
    let cell = |row: &[String], column: Option<usize>| {
        column
            .and_then(|c| row.get(c))
            .and_then(|text| clean_numeric(text))
    };

    for (row_index, row) in table.rows.iter().enumerate() {
        let dropped = |reason: String| DroppedRow {
            table_index: table.index,
            row_index,
            reason,
        };
        let Some(raw_date) = row.get(date_column) else {
            out.dropped.push(dropped(format!("row has no cell at date column {date_column}")));
            continue;
        };
        let Some(date) = parse_date(raw_date) else {
            out.dropped.push(dropped(format!("unparseable date {raw_date:?}")));
            continue;
        };

        out.records.push(NormalizedRecord {
            date,
            net_value: cell(row, columns.net_value),
            cumulative_net_value: cell(row, columns.cumulative),
            daily_growth_rate: cell(row, columns.growth_rate),
            table_index: table.index,
            row_index,
        });
    }
}
