//! The radsync mirror engine.
//!
//! [`synchronize`] mirrors a remote HTTP directory tree into a
//! [`StorageBackend`](radsync_storage::StorageBackend), prunes local files
//! that disappeared remotely and rebuilds a JSON index of the radar volumes
//! on disk. Each step is also available on its own:
//!
//! - [`mirror_tree`]: crawl and download, returning the found-set.
//! - [`prune`]: delete local files outside a found-set.
//! - [`build_index`] and [`write_index`]: scan the mirror and persist the
//!   index; [`rebuild_index`] does both.

pub mod download;
pub mod error;
mod index;
pub mod listing;
mod pipeline;
mod reconcile;
mod report;
mod sync;

pub use crate::download::{RetryPolicy, download_file};
pub use crate::index::{IndexRecord, build_index, write_index};
pub use crate::listing::fetch_listing;
pub use crate::pipeline::{rebuild_index, synchronize};
pub use crate::reconcile::{PruneOutcome, prune};
pub use crate::report::SyncReport;
pub use crate::sync::{
    DEFAULT_DIRECTORY_CONCURRENCY, DEFAULT_FILE_CONCURRENCY, DEFAULT_INDEX_FILE, DEFAULT_MAX_DEPTH, MirrorOutcome,
    SyncOptions, mirror_tree,
};
