//! CBZ containers through Info-ZIP's `zip` and `unzip`.

use super::{ArchiveBackend, absolute, ensure_dir, ensure_not_empty};
use crate::Format;
use crate::error::{ErrorKind, Result};
use crate::tool::Invocation;
use std::path::Path;
use tracing::instrument;

/// `unzip` exit code for "completed, but with warnings".
const UNZIP_WARNING: i32 = 1;

/// Zip-based comic containers (`.cbz`).
#[derive(Debug, Clone)]
pub struct ZipBackend {
    writer: String,
    reader: String,
}

impl ZipBackend {
    /// Create a backend using the given writer (`zip`) and reader (`unzip`)
    /// programs.
    pub fn new(writer: impl Into<String>, reader: impl Into<String>) -> Self {
        Self {
            writer: writer.into(),
            reader: reader.into(),
        }
    }
}

impl Default for ZipBackend {
    fn default() -> Self {
        Self::new("zip", "unzip")
    }
}

impl ArchiveBackend for ZipBackend {
    fn format(&self) -> Format {
        Format::Cbz
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn extract(&self, container: &Path, target: &Path) -> Result<()> {
        ensure_dir(target).map_err(|e| ErrorKind::extract_failed(e, container))?;
        Invocation::new(&self.reader)
            .args(["-o", "-qq"])
            .arg(container)
            .arg("-d")
            .arg(target)
            .tolerate(UNZIP_WARNING)
            .run()
            .map_err(|e| ErrorKind::extract_failed(e, container))?;
        Ok(())
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn pack(&self, source: &Path, container: &Path) -> Result<()> {
        ensure_not_empty(source, container)?;
        let output = absolute(container).map_err(|e| ErrorKind::pack_failed(e, container))?;
        // -X: leave out extra file attributes (uid/gid, extended timestamps),
        // so members depend only on their content.
        Invocation::new(&self.writer)
            .args(["-r", "-q", "-X"])
            .arg(&output)
            .arg(".")
            .current_dir(source)
            .run()
            .map_err(|e| ErrorKind::pack_failed(e, container))?;
        tracing::debug!(container = %output.display(), "Packed zip container");
        Ok(())
    }
}
