//! Table shape validation.

use serde::{Deserialize, Serialize};

use crate::extract::{PageSnapshot, Table};

/// Outcome of [`validate`]. Never modifies the snapshot it describes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `issues` is empty.
    pub is_valid: bool,
    /// Human-readable problems, one per table at most plus the global one.
    pub issues: Vec<String>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

/// Checks that the snapshot has tables and that each table is rectangular.
///
/// Rows are compared against the header count, or against the first row when
/// the table has no headers. All offending rows of a table are named in a
/// single issue.
#[must_use]
pub fn validate(snapshot: &PageSnapshot) -> ValidationReport {
    if snapshot.tables.is_empty() {
        return ValidationReport::from_issues(vec!["no tables found".to_string()]);
    }
    let issues = snapshot.tables.iter().filter_map(table_issue).collect();
    ValidationReport::from_issues(issues)
}

fn table_issue(table: &Table) -> Option<String> {
    if table.rows.is_empty() {
        return Some(format!("table {} has no data rows", table.index));
    }

    let expected = table.expected_width()?;
    let offending: Vec<String> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.len() != expected)
        .map(|(i, row)| format!("{i} ({} cells)", row.len()))
        .collect();
    if offending.is_empty() {
        return None;
    }

    let basis = if table.headers.is_empty() {
        "first row"
    } else {
        "headers"
    };
    Some(format!(
        "table {}: rows {} do not match the {expected} columns of its {basis}",
        table.index,
        offending.join(", ")
    ))
}
