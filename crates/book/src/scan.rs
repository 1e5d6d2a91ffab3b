//! Lazy discovery of comic containers beneath a directory.

use crate::error::{ErrorKind, Result};
use comix_archive::Format;
use exn::ResultExt;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Iterator returned by [`scan`].
///
/// Directories are read one at a time as the iteration reaches them, so
/// the sequence reflects the filesystem as it is while being consumed.
pub struct Scanner {
    root: Option<PathBuf>,
    stack: Vec<IntoIter<PathBuf>>,
}

/// Walk `root` recursively, yielding every file with a container extension
/// (cbz, cbr or pdf, in any case).
///
/// Entries of each directory are visited in sorted order, descending into
/// subdirectories as they come. A missing `root` yields nothing; a `root`
/// that is itself a container file yields just that file. Each call starts a
/// fresh walk.
///
/// # Example
///
/// ```no_run
/// for path in comix_book::scan("/comics") {
///     println!("{}", path?.display());
/// }
/// # Ok::<(), comix_book::error::Error>(())
/// ```
pub fn scan(root: impl Into<PathBuf>) -> Scanner {
    Scanner {
        root: Some(root.into()),
        stack: Vec::new(),
    }
}

impl Scanner {
    fn start(&mut self, root: PathBuf) -> Result<Option<PathBuf>> {
        let metadata = match fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io),
        };
        if metadata.is_dir() {
            self.stack.push(read_sorted(&root)?);
            return Ok(None);
        }
        Ok(Some(root).filter(|path| Format::is_supported_path(path)))
    }
}

impl Iterator for Scanner {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            match self.start(root) {
                Ok(Some(file)) => return Some(Ok(file)),
                Ok(None) => {},
                Err(err) => return Some(Err(err)),
            }
        }
        loop {
            let entries = self.stack.last_mut()?;
            let Some(path) = entries.next() else {
                self.stack.pop();
                continue;
            };
            match classify(path) {
                Ok(WalkEntry::File(path)) if Format::is_supported_path(&path) => return Some(Ok(path)),
                Ok(WalkEntry::Descend(path)) => match read_sorted(&path) {
                    Ok(children) => self.stack.push(children),
                    Err(err) => return Some(Err(err)),
                },
                Ok(WalkEntry::File(_) | WalkEntry::Skip) => {},
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn read_sorted(dir: &Path) -> Result<IntoIter<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .or_raise(|| ErrorKind::Io)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .or_raise(|| ErrorKind::Io)?;
    paths.sort();
    Ok(paths.into_iter())
}

/// Follows symlinks to files; never descends through a symlinked directory.
fn classify(path: PathBuf) -> Result<WalkEntry> {
    let link = fs::symlink_metadata(&path).or_raise(|| ErrorKind::Io)?;
    if link.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    let is_file = match link.is_symlink() {
        true => fs::metadata(&path).is_ok_and(|target| target.is_file()),
        false => link.is_file(),
    };
    match is_file {
        true => Ok(WalkEntry::File(path)),
        false => Ok(WalkEntry::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn collect(root: &Path) -> Vec<PathBuf> {
        scan(root).map(|path| path.unwrap().strip_prefix(root).unwrap().to_path_buf()).collect()
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect(dir.path()).is_empty());
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(scan(dir.path().join("missing")).count(), 0);
    }

    #[test]
    fn only_containers_are_yielded() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("issue.cbz"));
        touch(&dir.path().join("notes.txt"));
        assert_eq!(collect(dir.path()), vec![PathBuf::from("issue.cbz")]);
    }

    #[test]
    fn recurses_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b/02.CBR", "b/01.pdf", "a.cbz", "c/d/e.Pdf", "c/cover.jpg", "b.zip"] {
            touch(&dir.path().join(name));
        }
        assert_eq!(
            collect(dir.path()),
            ["a.cbz", "b/01.pdf", "b/02.CBR", "c/d/e.Pdf"].map(PathBuf::from).to_vec()
        );
    }

    #[test]
    fn root_file_is_yielded_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.cbr");
        touch(&file);
        assert_eq!(scan(&file).map(Result::unwrap).collect::<Vec<_>>(), vec![file.clone()]);
        touch(&dir.path().join("single.txt"));
        assert_eq!(scan(dir.path().join("single.txt")).count(), 0);
    }

    #[test]
    fn rescanning_sees_new_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one.cbz"));
        assert_eq!(scan(dir.path()).count(), 1);
        touch(&dir.path().join("two.cbz"));
        assert_eq!(scan(dir.path()).count(), 2);
    }
}
