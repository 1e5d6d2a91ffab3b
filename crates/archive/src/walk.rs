//! Recursive listing of the regular files beneath a directory.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// List every regular file beneath `root`, as paths relative to `root`,
/// sorted lexically by path.
///
/// Symlinks are not followed (and not listed): archivers can store them, and
/// a link back up the tree would never terminate.
/// A `root` that does not exist yields an empty list.
pub fn list_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io),
        };
        for entry in entries {
            let entry = entry.or_raise(|| ErrorKind::Io)?;
            match classify(&entry)? {
                WalkEntry::File(path) => {
                    let relative = path.strip_prefix(root).or_raise(|| ErrorKind::Io)?;
                    files.push(relative.to_path_buf());
                },
                WalkEntry::Descend(path) => stack.push(path),
                WalkEntry::Skip => {},
            }
        }
    }
    files.sort();
    Ok(files)
}

fn classify(entry: &fs::DirEntry) -> Result<WalkEntry> {
    let file_type = entry.file_type().or_raise(|| ErrorKind::Io)?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(entry.path()));
    }
    if file_type.is_file() {
        return Ok(WalkEntry::File(entry.path()));
    }
    Ok(WalkEntry::Skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::write(dir.path().join("z.png"), b"z").unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();
        fs::write(dir.path().join("b/inner/c.png"), b"c").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("a.png"), PathBuf::from("b/inner/c.png"), PathBuf::from("z.png")]
        );
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(dir.path().join("nope")).unwrap().is_empty());
    }
}
