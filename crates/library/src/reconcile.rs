use futures::StreamExt;
use radsync_storage::BackendHandle;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// What [`prune`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub pruned: u64,
    /// Entries that could not be inspected or deleted.
    pub failed: u64,
}

/// Deletes every local file that is neither in `found` nor the index.
///
/// Failures are logged and counted, never fatal. Directories are left in
/// place even when they end up empty.
#[instrument(level = "debug", skip_all, fields(backend = backend.name(), found = found.len()))]
pub async fn prune(backend: &BackendHandle, found: &HashSet<PathBuf>, index_file: &Path) -> PruneOutcome {
    let mut outcome = PruneOutcome::default();

    // Walk to the end before deleting anything, so the walk never looks at
    // directories that are being changed underneath it.
    let mut stale = Vec::new();
    let mut files = backend.list_stream();
    while let Some(file) = files.next().await {
        match file {
            Ok(file) if file.path == index_file || found.contains(&file.path) => {},
            Ok(file) => stale.push(file),
            Err(err) => {
                tracing::warn!(error = ?err, "Could not inspect local entry");
                outcome.failed += 1;
            },
        }
    }

    for file in stale {
        match backend.delete(&file.path).await {
            Ok(()) => {
                tracing::info!(path = %file.path.display(), bytes = file.size, "Pruned");
                outcome.pruned += 1;
            },
            Err(err) => {
                tracing::error!(path = %file.path.display(), error = ?err, "Could not prune");
                outcome.failed += 1;
            },
        }
    }
    outcome
}
