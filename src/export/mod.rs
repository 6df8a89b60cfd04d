//! Output files for scraped snapshots.
//!
//! Every file is written to a temporary sibling and renamed into place, so a
//! failed or interrupted export never leaves a truncated file behind.
//!
//! | File | Contents |
//! |------|----------|
//! | `{prefix}_{ts}.json` | the snapshot document |
//! | `{prefix}_table_{index}_{ts}.csv` | one per table, UTF-8 with BOM |
//! | `{prefix}_records_{ts}.csv` | net-value records, when any exist |
//! | `{prefix}_report_{ts}.txt` | plain-text summary |
//! | `{prefix}_merged_{ts}.json` | merged snapshots of a batch |

mod atomic;
mod csv_out;
mod error;
mod exporter;
mod report;

pub use error::ExportError;
pub use exporter::{DEFAULT_FILE_PREFIX, ExportPaths, Exporter};
pub use report::render_report;
