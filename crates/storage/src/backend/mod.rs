//! Storage backend trait and implementations.
//!
//! The mirror engine never touches the filesystem directly; everything goes
//! through [`StorageBackend`], so the whole sync can run against the in-memory
//! [`MockBackend`] in tests.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::FileInfo;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// A fallible stream of body chunks, e.g. an HTTP response being downloaded.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'a>>;

/// Name of the hidden sibling a streamed write goes to before it is renamed
/// into place, e.g. `boo/.LATEST.part` for `boo/LATEST`.
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!(".{name}.part"))
}

/// Unified interface over the mirror root.
///
/// All paths are relative to the mirror root and are validated with
/// [`validate_path`](crate::validate_path) by every implementation, so a
/// hostile remote listing cannot write or delete outside of it.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use radsync_storage::{StorageBackend, error::Result};
///
/// async fn needs_download(backend: &dyn StorageBackend, path: &Path) -> Result<bool> {
///     Ok(!backend.exists(path).await?)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List every file below the mirror root.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`].
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream every file below the mirror root, in no particular order.
    ///
    /// Errors for individual entries are yielded in-line; the walk carries on
    /// with the next entry.
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, replacing any existing file.
    ///
    /// # Notes
    /// - Implementations create parent directories as needed.
    /// - Readers never observe a half-written file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Write a stream of chunks to a file, returning the number of bytes
    /// written.
    ///
    /// # Notes
    /// - Implementations create parent directories as needed.
    /// - The destination is only replaced once the stream has been fully
    ///   consumed. If the stream (or the write) fails, the destination is left
    ///   exactly as it was and nothing partial remains.
    async fn write_stream(&self, path: &Path, stream: ByteStream<'_>) -> Result<u64>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        assert_eq!(partial_path(Path::new("boo/hdf5/LATEST")), Path::new("boo/hdf5/.LATEST.part"));
        assert_eq!(partial_path(Path::new("LATEST")), Path::new(".LATEST.part"));
    }
}
