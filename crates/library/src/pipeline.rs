use crate::error::{ErrorKind, Result};
use crate::index::{build_index, write_index};
use crate::reconcile::prune;
use crate::report::SyncReport;
use crate::sync::{MirrorOutcome, SyncOptions, mirror_tree};
use exn::ResultExt;
use radsync_remote::TransportHandle;
use radsync_storage::{BackendHandle, validate_path};
use std::path::Path;
use url::Url;

/// Runs a full pass: mirror the remote tree, prune what vanished remotely,
/// then rebuild the index from what is on disk.
///
/// Returns an error only when the run as a whole failed: the root could not
/// be listed or listed nothing to mirror (nothing is pruned or indexed then),
/// or the index could not be written. Everything else ends up in the returned [`SyncReport`].
pub async fn synchronize(
    transport: &TransportHandle,
    backend: &BackendHandle,
    root: &Url,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let index_file = validate_path(&options.index_file).or_raise(|| ErrorKind::Index)?;
    let MirrorOutcome { found, mut report } = mirror_tree(transport, backend, root, options).await?;

    let pruned = prune(backend, &found, &index_file).await;
    report.pruned = pruned.pruned;
    report.prune_failures = pruned.failed;

    report.indexed = rebuild_index(backend, &index_file).await? as u64;
    Ok(report)
}

/// Rebuilds the index from the files currently in the mirror, without
/// touching the network. Returns the number of indexed volumes.
pub async fn rebuild_index(backend: &BackendHandle, index_file: &Path) -> Result<usize> {
    let index_file = validate_path(index_file).or_raise(|| ErrorKind::Index)?;
    let records = build_index(backend, &index_file).await;
    write_index(backend, &index_file, &records).await?;
    Ok(records.len())
}
