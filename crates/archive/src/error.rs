//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file extension (or format name) is not one of cbz, cbr or pdf.
    #[display("unsupported container format: {_0}")]
    NotSupported(#[error(not(source))] String),
    /// Reading the container into a directory failed.
    #[display("failed to extract {}: {reason}", path.display())]
    ExtractFailed { path: PathBuf, reason: String },
    /// Building the container from a directory failed.
    #[display("failed to pack {}: {reason}", path.display())]
    PackFailed { path: PathBuf, reason: String },
    /// The external program is not installed (or not on `PATH`).
    #[display("program '{_0}' is not installed")]
    ToolNotFound(#[error(not(source))] String),
    /// The external program ran but reported failure.
    #[display("{program} exited with {}: {diagnostic}", exit_status(code))]
    ToolFailed {
        program: String,
        code: Option<i32>,
        diagnostic: String,
    },
    /// The source directory holds nothing the target format can contain.
    #[display("no packable content")]
    NothingToPack,
    /// The source holds an image the target format has no encoding for.
    #[display("{} is an image this format cannot hold", _0.display())]
    Unpackable(#[error(not(source))] PathBuf),
    #[display("I/O error")]
    Io,
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// A missing binary or a failing tool stays broken until the environment
    /// is fixed, so nothing here is retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Re-raise a tool (or I/O) failure as [`ExtractFailed`](Self::ExtractFailed),
    /// keeping the original frame as a child and its message as the reason.
    #[track_caller]
    pub fn extract_failed(err: Error, path: impl Into<PathBuf>) -> Error {
        let reason = (*err).to_string();
        err.raise(ErrorKind::ExtractFailed { path: path.into(), reason })
    }

    /// Re-raise a tool (or I/O) failure as [`PackFailed`](Self::PackFailed).
    #[track_caller]
    pub fn pack_failed(err: Error, path: impl Into<PathBuf>) -> Error {
        let reason = (*err).to_string();
        err.raise(ErrorKind::PackFailed { path: path.into(), reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotSupported("epub".to_string()).to_string(), "unsupported container format: epub");
        assert_eq!(ErrorKind::ToolNotFound("unrar".to_string()).to_string(), "program 'unrar' is not installed");
        let failed = ErrorKind::ToolFailed {
            program: "zip".to_string(),
            code: Some(12),
            diagnostic: "nothing to do!".to_string(),
        };
        assert_eq!(failed.to_string(), "zip exited with code 12: nothing to do!");
        assert_eq!(
            ErrorKind::Unpackable(PathBuf::from("image_0001_001.jb2e")).to_string(),
            "image_0001_001.jb2e is an image this format cannot hold"
        );
    }

    #[test]
    fn extract_failed_keeps_diagnostic() {
        let err = exn::Exn::from(ErrorKind::ToolFailed {
            program: "unzip".to_string(),
            code: Some(9),
            diagnostic: "cannot find zipfile directory".to_string(),
        });
        let err = ErrorKind::extract_failed(err, "/comics/a.cbz");
        match &*err {
            ErrorKind::ExtractFailed { path, reason } => {
                assert_eq!(path, &PathBuf::from("/comics/a.cbz"));
                assert!(reason.contains("cannot find zipfile directory"));
            },
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!ErrorKind::Io.is_retryable());
        assert!(!ErrorKind::ToolNotFound("zip".to_string()).is_retryable());
    }
}
