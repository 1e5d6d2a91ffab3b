//! Book Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use comix_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};
use comix_metadata::error::Error as MetadataError;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A book error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for book operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path's extension isn't a supported container format.
    #[display("unsupported container format: {_0}")]
    NotSupported(#[error(not(source))] String),
    #[display("{} is already open", _0.display())]
    AlreadyOpen(#[error(not(source))] PathBuf),
    #[display("{} is not open", _0.display())]
    NotOpen(#[error(not(source))] PathBuf),
    /// The container couldn't be read; the tool's diagnostic is included.
    #[display("{_0}")]
    ExtractFailed(#[error(not(source))] String),
    /// The container couldn't be written; the tool's diagnostic is included.
    /// The previous container file is left as it was.
    #[display("{_0}")]
    PackFailed(#[error(not(source))] String),
    /// An external program is missing or failed outside an extract or pack.
    /// Retrying won't help until the environment is fixed.
    #[display("{_0}")]
    ToolFailed(#[error(not(source))] String),
    /// A member path is empty or would leave the working directory.
    #[display("invalid member path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The metadata descriptor couldn't be read or written.
    #[display("metadata error")]
    Metadata,
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }

    /// Convert an archive error into a book error, preserving the archive
    /// crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn archive(err: ArchiveError) -> Error {
        let kind = match &*err {
            ArchiveErrorKind::NotSupported(name) => ErrorKind::NotSupported(name.clone()),
            ArchiveErrorKind::ExtractFailed { .. } => ErrorKind::ExtractFailed((*err).to_string()),
            ArchiveErrorKind::PackFailed { .. }
            | ArchiveErrorKind::NothingToPack
            | ArchiveErrorKind::Unpackable(_) => ErrorKind::PackFailed((*err).to_string()),
            ArchiveErrorKind::ToolNotFound(_) | ArchiveErrorKind::ToolFailed { .. } => {
                ErrorKind::ToolFailed((*err).to_string())
            },
            ArchiveErrorKind::Io => ErrorKind::Io,
        };
        err.raise(kind)
    }

    /// Convert a metadata error into a book error.
    #[track_caller]
    pub fn metadata(err: MetadataError) -> Error {
        err.raise(ErrorKind::Metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::AlreadyOpen(PathBuf::from("/comics/a.cbz")).to_string(), "/comics/a.cbz is already open");
        assert_eq!(ErrorKind::NotOpen(PathBuf::from("a.cbr")).to_string(), "a.cbr is not open");
        assert_eq!(ErrorKind::InvalidPath(PathBuf::from("../x")).to_string(), "invalid member path: ../x");
    }

    #[test]
    fn archive_errors_keep_their_reason() {
        let err = exn::Exn::from(ArchiveErrorKind::PackFailed {
            path: PathBuf::from("/comics/a.cbz"),
            reason: "zip exited with code 15: could not create output file".to_string(),
        });
        let err = ErrorKind::archive(err);
        match &*err {
            ErrorKind::PackFailed(reason) => assert!(reason.contains("could not create output file")),
            other => panic!("unexpected error kind: {other:?}"),
        }

        let err = ErrorKind::archive(exn::Exn::from(ArchiveErrorKind::NotSupported("epub".to_string())));
        assert_eq!(*err, ErrorKind::NotSupported("epub".to_string()));
    }

    #[test]
    fn tool_errors_are_not_retryable() {
        let missing = ErrorKind::archive(exn::Exn::from(ArchiveErrorKind::ToolNotFound("unrar".to_string())));
        assert_eq!(*missing, ErrorKind::ToolFailed("program 'unrar' is not installed".to_string()));
        assert!(!missing.is_retryable());

        let failed = ErrorKind::archive(exn::Exn::from(ArchiveErrorKind::ToolFailed {
            program: "zip".to_string(),
            code: Some(15),
            diagnostic: "could not create output file".to_string(),
        }));
        assert!(matches!(&*failed, ErrorKind::ToolFailed(reason) if reason.contains("could not create output file")));
        assert!(!failed.is_retryable());

        let io = ErrorKind::archive(exn::Exn::from(ArchiveErrorKind::Io));
        assert!(io.is_retryable());
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io.is_retryable());
        assert!(!ErrorKind::PackFailed(String::new()).is_retryable());
        assert!(!ErrorKind::NotOpen(PathBuf::new()).is_retryable());
    }
}
