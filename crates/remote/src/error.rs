//! Transport Error Types

use derive_more::{Display, Error};

/// A transport error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed (bad TLS setup, etc.)
    #[display("could not build HTTP client: {_0}")]
    Client(#[error(not(source))] String),
    /// No connection could be established.
    #[display("connection failed")]
    Connect,
    /// A configured read or request timeout elapsed.
    #[display("request timed out")]
    Timeout,
    /// Any other failure before a status line was received.
    #[display("request failed: {_0}")]
    Request(#[error(not(source))] String),
    /// The response body could not be read.
    #[display("failed to read response body")]
    Body,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Client(_))
    }
}
