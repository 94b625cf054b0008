//! Atomic JSON Writes
//!
//! Writes go to a hidden temporary sibling (`.<name>.<uuid>.tmp`) and are
//! renamed into place, so a reader sees either the old file or the new one,
//! never a partial write.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// Parent directories are created as needed. The temporary file is removed
/// if the write or rename fails.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let content = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let temp_path = temp_sibling(path)?;
    if let Err(e) = write_then_rename(&temp_path, path, &content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn write_then_rename(temp_path: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(temp_path, content).await?;
    fs::rename(temp_path, path).await
}

fn temp_sibling(path: &Path) -> AppResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| AppError::internal(format!("no file name in {}", path.display())))?;
    let temp_name = format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        uuid::Uuid::new_v4()
    );
    Ok(path.with_file_name(temp_name))
}

/// Whether a directory entry is a leftover temporary sibling.
pub fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}
