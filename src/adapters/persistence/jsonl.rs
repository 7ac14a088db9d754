//! JSON Lines helpers shared by the trade and balance logs.
//!
//! Each line is a self-contained JSON record. Writers only append; readers
//! skip blank and malformed lines so one corrupt record never hides the
//! rest of the log.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Append one record as a line to `path`, creating the file if needed.
pub(super) async fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut json = serde_json::to_string(record).context("Failed to serialize record")?;
    json.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    file.write_all(json.as_bytes())
        .await
        .context("Failed to write record")?;
    file.flush().await.context("Failed to flush log file")?;

    Ok(())
}

/// Read every well-formed record of one file. A missing file reads empty.
pub(super) async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    file = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed record"
                );
            }
        }
    }
    Ok(records)
}

/// Read every `*.jsonl` file in `dir`. A missing directory reads empty.
pub(super) async fn read_dir_records<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    let mut records = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            records.extend(read_records(&path).await?);
        }
    }
    Ok(records)
}
