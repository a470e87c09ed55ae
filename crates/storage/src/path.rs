//! Mirror-relative path validation.
//!
//! Every path handed to a backend is derived from an untrusted remote listing,
//! so it must never be able to escape the mirror root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a mirror-relative path.
///
/// `.` components and repeated or trailing separators are dropped, `..` is
/// resolved as long as it stays inside the root. Leading separators are
/// ignored, so `/boo/file` is treated as `boo/file`. Empty results, null bytes
/// and platform prefixes are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use radsync_storage::validate_path;
///
/// assert!(validate_path("boo/hdf5/rab02-pz_10132-20250529110000-deboo-hd5").is_ok());
/// assert!(validate_path("boo/../asb/LATEST").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("boo/../../escape").is_err());
/// assert!(validate_path("boo\0").is_err());
/// assert_eq!(validate_path("boo/./hdf5//LATEST/").unwrap(), Path::new("boo/hdf5/LATEST"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in the underlying syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Renders a mirror-relative path with `/` separators on every platform.
///
/// This is the form written to the index, so consumers on any OS can join it
/// with their own copy of the mirror root.
pub fn to_slash_string(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
