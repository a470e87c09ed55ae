use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use radsync_extract::{RadarMetadata, extract_metadata};
use radsync_storage::{BackendHandle, to_slash_string};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::instrument;

/// One indexed radar volume, as persisted in the index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Relative to the mirror root, `/`-separated on every platform.
    pub path: String,
    #[serde(flatten)]
    pub metadata: RadarMetadata,
}

/// Scans the mirror for radar volumes, sorted by path.
///
/// Files whose name does not carry radar metadata are left out, as is the
/// index itself. Entries that cannot be inspected are logged and skipped.
#[instrument(level = "debug", skip_all, fields(backend = backend.name()))]
pub async fn build_index(backend: &BackendHandle, index_file: &Path) -> Vec<IndexRecord> {
    let mut records = Vec::new();
    let mut files = backend.list_stream();
    while let Some(file) = files.next().await {
        let file = match file {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(error = ?err, "Skipping unreadable entry");
                continue;
            },
        };
        if file.path == index_file {
            continue;
        }
        if let Some(metadata) = extract_metadata(&file.path) {
            records.push(IndexRecord { path: to_slash_string(&file.path), metadata });
        }
    }
    records.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(records = records.len(), "Index built");
    records
}

/// Replaces the index file with `records` as pretty-printed JSON.
pub async fn write_index(backend: &BackendHandle, index_file: &Path, records: &[IndexRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records).or_raise(|| ErrorKind::Index)?;
    backend.write(index_file, &json).await.or_raise(|| ErrorKind::Index)?;
    tracing::info!(path = %index_file.display(), records = records.len(), "Index written");
    Ok(())
}
