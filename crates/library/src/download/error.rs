//! Error types for the [`download`](super) module.

use derive_more::{Display, Error};

/// A download error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for download operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies one failed download attempt.
///
/// ### Retryable
/// - [`ErrorKind::Request`]
/// - [`ErrorKind::Status`]
/// - [`ErrorKind::Write`]
///
/// ### Final
/// - [`ErrorKind::Rejected`] - the storage layer refused the destination
///   (invalid path, permission denied); another attempt cannot succeed.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("download request failed")]
    Request,
    #[display("download answered with status {_0}")]
    Status(#[error(not(source))] u16),
    /// Streaming the body to storage failed, on either side.
    #[display("could not store downloaded body")]
    Write,
    #[display("destination rejected by storage")]
    Rejected,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}
