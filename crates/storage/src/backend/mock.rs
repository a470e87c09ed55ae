//! In-memory storage backend for testing.

use super::{ByteStream, FileInfoStream};
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use crate::{FileInfo, StorageBackend};
use async_stream::stream;
use async_trait::async_trait;
use futures::TryStreamExt;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation.
///
/// # Examples
///
/// ```
/// use radsync_storage::backend::MockBackend;
/// use radsync_storage::StorageBackend;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("boo/hdf5/LATEST", b"20250529110000"),
/// ]);
/// assert!(backend.exists(Path::new("boo/hdf5/LATEST")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
    undeletable: HashSet<PathBuf>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            map.insert(Self::validated(path.into()), data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            undeletable: HashSet::new(),
        }
    }

    /// Make [`delete`](StorageBackend::delete) fail with
    /// [`PermissionDenied`](ErrorKind::PermissionDenied) for these paths.
    pub fn with_undeletable(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.undeletable.extend(paths.into_iter().map(|p| Self::validated(p.into())));
        self
    }

    /// Sorted snapshot of every stored path.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.storage.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn validated(path: PathBuf) -> PathBuf {
        let Ok(validated) = validate_path(&path) else {
            // The panic here is DELIBERATE: bad test setup, not a runtime error.
            panic!("MockBackend: invalid path {}", path.display());
        };
        validated
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard.iter().map(|(path, data)| FileInfo::new(path.clone(), data.len() as u64)).collect()
            };
            for entry in entries {
                yield Ok(entry);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, data.to_vec());
        Ok(())
    }

    async fn write_stream(&self, path: &Path, mut stream: ByteStream<'_>) -> Result<u64> {
        let path = validate_path(path)?;
        // Buffer everything first so a failing stream never touches storage.
        let mut data = Vec::new();
        while let Some(chunk) = stream.try_next().await.map_err(ErrorKind::Io)? {
            data.extend_from_slice(&chunk);
        }
        let written = data.len() as u64;
        self.storage.write().await.insert(path, data);
        Ok(written)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        if self.undeletable.contains(&path) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }
}
