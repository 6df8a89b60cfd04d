//! All-or-nothing file writes.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::ExportError;

/// Writes `contents` to a hidden sibling, syncs it, then renames it over `path`.
///
/// Readers see either the previous file or the complete new one. The
/// temporary file is removed when any step fails.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let temp = temp_sibling(path);
    if let Err(error) = write_and_sync(&temp, contents).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(error);
    }
    if let Err(source) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(ExportError::io(path, source));
    }
    debug!(path = %path.display(), bytes = contents.len(), "file written");
    Ok(())
}

async fn write_and_sync(temp: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let mut file = tokio::fs::File::create(temp)
        .await
        .map_err(|e| ExportError::io(temp, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| ExportError::io(temp, e))?;
    file.sync_all().await.map_err(|e| ExportError::io(temp, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
