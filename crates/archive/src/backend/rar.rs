//! CBR containers through RARLAB's `rar` and `unrar`.

use super::{ArchiveBackend, absolute, ensure_dir, ensure_not_empty};
use crate::Format;
use crate::error::{ErrorKind, Result};
use crate::tool::Invocation;
use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR_STR, Path};
use tracing::instrument;

/// Rar-based comic containers (`.cbr`).
#[derive(Debug, Clone)]
pub struct RarBackend {
    writer: String,
    reader: String,
}

impl RarBackend {
    /// Create a backend using the given writer (`rar`) and reader (`unrar`)
    /// programs.
    pub fn new(writer: impl Into<String>, reader: impl Into<String>) -> Self {
        Self {
            writer: writer.into(),
            reader: reader.into(),
        }
    }
}

impl Default for RarBackend {
    fn default() -> Self {
        Self::new("rar", "unrar")
    }
}

impl ArchiveBackend for RarBackend {
    fn format(&self) -> Format {
        Format::Cbr
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn extract(&self, container: &Path, target: &Path) -> Result<()> {
        ensure_dir(target).map_err(|e| ErrorKind::extract_failed(e, container))?;
        // unrar only treats the last argument as a destination directory
        // when it ends with a path separator.
        let mut destination = OsString::from(target);
        destination.push(MAIN_SEPARATOR_STR);
        Invocation::new(&self.reader)
            .args(["x", "-o+", "-y", "-idq"])
            .arg(container)
            .arg(destination)
            .run()
            .map_err(|e| ErrorKind::extract_failed(e, container))?;
        Ok(())
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn pack(&self, source: &Path, container: &Path) -> Result<()> {
        ensure_not_empty(source, container)?;
        let output = absolute(container).map_err(|e| ErrorKind::pack_failed(e, container))?;
        // The wildcard is expanded by rar itself (no shell involved).
        Invocation::new(&self.writer)
            .args(["a", "-r", "-y", "-idq"])
            .arg(&output)
            .arg("*")
            .current_dir(source)
            .run()
            .map_err(|e| ErrorKind::pack_failed(e, container))?;
        tracing::debug!(container = %output.display(), "Packed rar container");
        Ok(())
    }
}
