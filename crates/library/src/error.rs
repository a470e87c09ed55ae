//! Library Error Types
//!
//! Only failures that end a run surface here. Everything scoped to a single
//! directory or file is logged, counted in the
//! [`SyncReport`](crate::SyncReport) and skipped.

use derive_more::{Display, Error};
use url::Url;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The listing of the source root could not be fetched. Continuing would
    /// prune the whole mirror.
    #[display("could not list the source root {_0}")]
    RootListing(#[error(not(source))] Url),
    /// The source root answered, but nothing on the page is a link into the
    /// tree: a maintenance page or a changed layout rather than a listing.
    #[display("the source root {_0} lists nothing to mirror")]
    EmptyRoot(#[error(not(source))] Url),
    /// The index could not be serialized or written.
    #[display("could not write the index")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RootListing(_) | Self::EmptyRoot(_))
    }
}
