//! Normalization and validation of extracted snapshots.
//!
//! - [`clean_numeric`] turns display strings into exact decimals.
//! - [`validate`] reports structural problems without touching the snapshot.
//! - [`extract_financial_records`] maps recognized net-value tables to
//!   [`NormalizedRecord`]s using the [`COLUMN_RULES`] synonym table.
//! - [`merge_snapshots`] folds several pages into one [`AggregatedResult`].

mod columns;
mod merge;
mod numeric;
mod records;
mod validate;

pub use columns::{COLUMN_RULES, ColumnKind, ColumnMap, classify_header};
pub use merge::{AggregatedResult, SourceInfo, SourcedTable, filter_tables_by_header, merge_snapshots};
pub use numeric::clean_numeric;
pub use records::{DroppedRow, NormalizedRecord, RecordExtraction, extract_financial_records, parse_date};
pub use validate::{ValidationReport, validate};
