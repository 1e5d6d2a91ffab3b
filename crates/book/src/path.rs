//! Member path validation.
//!
//! Member paths come from callers and are joined onto the working directory,
//! so they must never be able to point outside of it.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validate a member path, returning it normalized.
///
/// `.` segments and repeated separators are dropped and `..` is resolved
/// lexically. Fails with [`InvalidPath`](ErrorKind::InvalidPath) if the
/// path is empty, absolute, contains a null byte, or climbs above the
/// working directory.
pub(crate) fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => {
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("page01.png", "page01.png")]
    #[case("pages//02.png", "pages/02.png")]
    #[case("./pages/./03.png", "pages/03.png")]
    #[case("pages/../ComicInfo.xml", "ComicInfo.xml")]
    fn test_valid_paths(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(validate(path).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../outside.png")]
    #[case("pages/../../outside.png")]
    #[case("/etc/passwd")]
    #[case("a\0b")]
    fn test_invalid_paths(#[case] path: &str) {
        let err = validate(path).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidPath(PathBuf::from(path)));
    }
}
