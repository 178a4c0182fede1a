use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::results::AllResults;

pub async fn save(results: &AllResults, path: &Path) -> Result<()> {
    write_json(results, path).await
}

pub async fn load(path: &Path) -> Result<AllResults> {
    let raw = tokio::fs::read(path).await.map_err(|source| Error::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Writes `value` as pretty JSON, creating missing parent directories.
pub async fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let persist_err = |source: std::io::Error| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(persist_err)?;
    }
    tokio::fs::write(path, json).await.map_err(persist_err)?;

    info!(path = %path.display(), "written");
    Ok(())
}

/// `docs/benchmark.json` + 2 -> `docs/benchmark.2.json`.
pub fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{n}"),
    };
    path.with_file_name(name)
}

/// Sibling path with a different suffix: `docs/benchmark.json` -> `docs/benchmark.charts.json`.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.{suffix}"))
}
