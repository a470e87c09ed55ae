//! Error types for the [`listing`](super) module.

use derive_more::{Display, Error};

/// A listing error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for listing operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a status.
    #[display("listing request failed")]
    Transport,
    /// The server answered with a non-success status.
    #[display("listing answered with status {_0}")]
    Status(#[error(not(source))] u16),
    /// The page could not be read to the end.
    #[display("could not read listing body")]
    Body,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
