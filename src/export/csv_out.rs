//! CSV encoding of tables and records.

use csv::WriterBuilder;
use rust_decimal::Decimal;

use super::error::ExportError;
use crate::extract::Table;
use crate::normalize::NormalizedRecord;

/// UTF-8 byte order mark so spreadsheet tools detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names of the records file.
pub(crate) const RECORD_COLUMNS: [&str; 4] = [
    "date",
    "net_value",
    "cumulative_net_value",
    "daily_growth_rate",
];

/// Encodes one table: a header row (empty when the table has none) then every row as-is.
pub(crate) fn table_to_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut buffer = UTF8_BOM.to_vec();
    if table.headers.is_empty() {
        // An empty record would be encoded as `""`; the header line stays blank instead.
        buffer.push(b'\n');
    }
    let mut writer = WriterBuilder::new().flexible(true).from_writer(buffer);
    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    finish(writer)
}

/// Encodes records with absent values as empty fields.
pub(crate) fn records_to_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    writer.write_record(RECORD_COLUMNS)?;
    let optional = |value: Option<Decimal>| value.map(|v| v.to_string()).unwrap_or_default();
    for record in records {
        writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            optional(record.net_value),
            optional(record.cumulative_net_value),
            optional(record.daily_growth_rate),
        ])?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap()).unwrap()
    }

    #[test]
    fn test_table_csv_has_bom_and_quotes_special_fields() {
        let table = Table {
            index: 0,
            headers: vec!["日期".into(), "备注".into()],
            rows: vec![
                vec!["2026-02-12".into(), "a, b".into()],
                vec!["2026-02-11".into(), "say \"hi\"".into()],
            ],
        };
        let bytes = table_to_csv(&table).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(
            text(&bytes),
            "日期,备注\n2026-02-12,\"a, b\"\n2026-02-11,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_table_csv_keeps_ragged_rows() {
        let table = Table {
            index: 1,
            headers: vec![],
            rows: vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        };
        let bytes = table_to_csv(&table).unwrap();
        assert_eq!(text(&bytes), "\na,b\nc\n");
        let lines: Vec<&str> = text(&bytes).lines().collect();
        assert_eq!(lines, vec!["", "a,b", "c"]);
    }

    #[test]
    fn test_records_csv_leaves_absent_values_empty() {
        let records = vec![NormalizedRecord {
            date: NaiveDate::from_ymd_opt(2026, 2, 12).unwrap(),
            net_value: Some(Decimal::new(12345, 4)),
            cumulative_net_value: None,
            daily_growth_rate: Some(Decimal::new(12, 4)),
            table_index: 0,
            row_index: 0,
        }];
        let bytes = records_to_csv(&records).unwrap();
        assert_eq!(
            text(&bytes),
            "date,net_value,cumulative_net_value,daily_growth_rate\n2026-02-12,1.2345,,0.0012\n"
        );
    }
}
