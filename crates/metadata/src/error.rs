//! Metadata Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The descriptor is not well-formed XML, or not a `ComicInfo` document.
    /// Callers opening a book treat this as "no metadata".
    #[display("malformed descriptor: {_0}")]
    Malformed(#[error(not(source))] String),
    /// The tag name can't be written as an XML element name.
    #[display("invalid tag name: {_0:?}")]
    InvalidTag(#[error(not(source))] String),
    /// The name belongs to a nested structure (such as `<Pages>`), not a
    /// text field; setting it would leave two elements of that name.
    #[display("{_0} holds nested elements, not a text value")]
    NotAField(#[error(not(source))] String),
    /// Reading or writing the descriptor file failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::Malformed("unexpected root element".to_string()).to_string(),
            "malformed descriptor: unexpected root element"
        );
        assert_eq!(ErrorKind::InvalidTag("Story Arc".to_string()).to_string(), "invalid tag name: \"Story Arc\"");
        assert_eq!(
            ErrorKind::NotAField("Pages".to_string()).to_string(),
            "Pages holds nested elements, not a text value"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::Malformed(String::new()).is_retryable());
        assert!(!ErrorKind::InvalidTag(String::new()).is_retryable());
        assert!(!ErrorKind::NotAField(String::new()).is_retryable());
        assert!(ErrorKind::Io.is_retryable());
    }
}
