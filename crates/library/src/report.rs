use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub directories_listed: u64,
    /// Non-root directories whose listing failed and were treated as empty.
    pub listing_failures: u64,
    /// Links refused for leaving the tree, revisiting a directory or going
    /// deeper than allowed.
    pub links_rejected: u64,
    pub files_found: u64,
    pub downloaded: u64,
    /// Files already present locally.
    pub skipped: u64,
    pub failed: u64,
    pub bytes_written: u64,
    pub pruned: u64,
    pub prune_failures: u64,
    pub indexed: u64,
}
impl SyncReport {
    /// `true` if nothing went wrong anywhere in the run.
    pub fn is_clean(&self) -> bool {
        self.listing_failures == 0 && self.failed == 0 && self.prune_failures == 0
    }
}
impl Display for SyncReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} directories listed ({} failed, {} links rejected), {} files found: {} downloaded ({} bytes), {} already present, {} failed; {} pruned ({} failed); {} indexed",
            self.directories_listed,
            self.listing_failures,
            self.links_rejected,
            self.files_found,
            self.downloaded,
            self.bytes_written,
            self.skipped,
            self.failed,
            self.pruned,
            self.prune_failures,
            self.indexed,
        )
    }
}

/// Live counters shared by every branch of a traversal.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub(crate) directories_listed: AtomicU64,
    pub(crate) listing_failures: AtomicU64,
    pub(crate) links_rejected: AtomicU64,
    pub(crate) files_found: AtomicU64,
    pub(crate) downloaded: AtomicU64,
    pub(crate) skipped: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) bytes_written: AtomicU64,
}
impl Stats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SyncReport {
        SyncReport {
            directories_listed: self.directories_listed.load(Ordering::Relaxed),
            listing_failures: self.listing_failures.load(Ordering::Relaxed),
            links_rejected: self.links_rejected.load(Ordering::Relaxed),
            files_found: self.files_found.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            ..SyncReport::default()
        }
    }
}
