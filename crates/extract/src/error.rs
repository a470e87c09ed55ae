//! Extraction Error Types
//!
//! Structured errors using `exn` for location tracking. Nothing in this crate
//! performs I/O, so none of these are worth retrying.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The filename does not follow the radar volume naming grammar.
    #[display("not a radar volume filename: {_0}")]
    NoMatch(#[error(not(source))] String),
    /// The filename matched, but one of the captured fields is unusable.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::NoMatch("radar_photo.png".to_string()).to_string(),
            "not a radar volume filename: radar_photo.png"
        );
        assert_eq!(
            ErrorKind::ParseError { field: "radar_id", value: "99999999999999999999999".to_string() }.to_string(),
            "failed to parse field 'radar_id', found value: 99999999999999999999999"
        );
    }
}
