//! Export error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while writing output files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem failure at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (shouldn't occur for well-formed values).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding error.
    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
