//! Table extraction.

use scraper::{ElementRef, Html};

use super::dom::{child_elements, visible_text};
use super::snapshot::Table;

struct RawRow {
    cells: Vec<String>,
    all_th: bool,
    in_thead: bool,
}

/// Extracts every `<table>` that has at least one row, in document order.
pub(crate) fn extract_tables(document: &Html) -> Vec<Table> {
    table_elements(document)
        .enumerate()
        .filter_map(|(index, element)| build_table(index, element))
        .collect()
}

/// Number of `<table>` elements, empty ones included.
pub(crate) fn table_slots(document: &Html) -> usize {
    table_elements(document).count()
}

fn table_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "table")
}

fn build_table(index: usize, table: ElementRef<'_>) -> Option<Table> {
    let mut raw = Vec::new();
    collect_rows(table, false, &mut raw);

    let mut rows = raw.into_iter();
    let first = rows.next()?;
    let (headers, mut body) = if first.in_thead || first.all_th {
        (first.cells, Vec::new())
    } else {
        (Vec::new(), vec![first.cells])
    };
    body.extend(rows.map(|r| r.cells));

    Some(Table {
        index,
        headers,
        rows: body,
    })
}

/// Collects `<tr>` rows owned by this table, skipping nested tables.
fn collect_rows(element: ElementRef<'_>, in_thead: bool, out: &mut Vec<RawRow>) {
    for child in child_elements(element) {
        match child.value().name() {
            "table" => {}
            "tr" => out.push(read_row(child, in_thead)),
            "thead" => collect_rows(child, true, out),
            _ => collect_rows(child, in_thead, out),
        }
    }
}

fn read_row(row: ElementRef<'_>, in_thead: bool) -> RawRow {
    let mut cells = Vec::new();
    let mut all_th = true;
    for cell in child_elements(row) {
        match cell.value().name() {
            "th" => cells.push(visible_text(cell)),
            "td" => {
                all_th = false;
                cells.push(visible_text(cell));
            }
            _ => {}
        }
    }
    RawRow {
        all_th: all_th && !cells.is_empty(),
        cells,
        in_thead,
    }
}
