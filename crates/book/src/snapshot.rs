use crate::error::{ErrorKind, Result};
use comix_archive::list_files;
use exn::ResultExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Size and modification time of every file in a working directory, used
/// to tell whether a container needs repacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot(BTreeMap<PathBuf, (u64, Option<SystemTime>)>);

impl Snapshot {
    pub(crate) fn take(dir: &Path) -> Result<Self> {
        let files = list_files(dir).map_err(ErrorKind::archive)?;
        let mut entries = BTreeMap::new();
        for file in files {
            let metadata = std::fs::metadata(dir.join(&file)).or_raise(|| ErrorKind::Io)?;
            entries.insert(file, (metadata.len(), metadata.modified().ok()));
        }
        Ok(Self(entries))
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_added_removed_and_resized_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01.png"), b"one").unwrap();
        let before = Snapshot::take(dir.path()).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(Snapshot::take(dir.path()).unwrap(), before);

        fs::write(dir.path().join("01.png"), b"one, but longer").unwrap();
        assert_ne!(Snapshot::take(dir.path()).unwrap(), before);

        fs::write(dir.path().join("01.png"), b"one").unwrap();
        fs::write(dir.path().join("02.png"), b"two").unwrap();
        let two = Snapshot::take(dir.path()).unwrap();
        assert_eq!(two.len(), 2);
        fs::remove_file(dir.path().join("02.png")).unwrap();
        assert_ne!(Snapshot::take(dir.path()).unwrap(), two);
    }
}
