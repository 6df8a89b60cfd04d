//! List-layout fallback for pages that render their data without `<table>`.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::dom::{child_elements, visible_text};
use super::snapshot::Table;

/// Item selectors tried in order; the first with more than one item wins.
const LIST_ITEM_SELECTORS: [&str; 5] = [
    ".data-list .item",
    ".netvalue-list .item",
    ".list-item",
    "[class*='list'] > div",
    ".row",
];

/// Builds a headerless table from the first list layout with several items.
///
/// An item with more than one non-empty child element gives one cell per
/// child; any other item gives a single cell with its whole text.
pub(crate) fn extract_list_table(document: &Html, index: usize) -> Option<Table> {
    for raw in LIST_ITEM_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let items: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if items.len() < 2 {
            continue;
        }

        let rows: Vec<Vec<String>> = items
            .into_iter()
            .map(item_cells)
            .filter(|cells| !cells.is_empty())
            .collect();
        if !rows.is_empty() {
            debug!(selector = raw, rows = rows.len(), "list items extracted");
            return Some(Table {
                index,
                headers: Vec::new(),
                rows,
            });
        }
    }
    None
}

fn item_cells(item: ElementRef<'_>) -> Vec<String> {
    let parts: Vec<String> = child_elements(item)
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect();
    if parts.len() > 1 {
        return parts;
    }
    let text = visible_text(item);
    if text.is_empty() { Vec::new() } else { vec![text] }
}
