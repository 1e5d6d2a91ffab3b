//! Archive backend trait and implementations.
//!
//! This module defines the [`ArchiveBackend`] trait, the narrow capability
//! contract (extract and pack) every container format implements, along
//! with the [`Backends`] registry used to pick the backend for a [`Format`].
//!
//! All process invocation, exit-code interpretation and diagnostic capture
//! lives behind this trait, so callers can substitute fakes in tests.

#[cfg(feature = "mock")]
mod mock;
mod pdf;
mod rar;
mod zip;

#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::pdf::PdfBackend;
pub use self::rar::RarBackend;
pub use self::zip::ZipBackend;
use crate::error::{ErrorKind, Result};
use crate::walk::list_files;
use crate::{BackendHandle, Format, ToolConfig};
use exn::ResultExt;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unified interface for container backends.
///
/// Both operations are blocking; control only returns once the underlying
/// tool has exited. Failures are reported once and never retried.
///
/// # Examples
///
/// ```no_run
/// use comix_archive::{ArchiveBackend, ZipBackend};
/// use std::path::Path;
/// # fn example() -> comix_archive::error::Result<()> {
/// let backend = ZipBackend::default();
/// backend.extract(Path::new("/comics/issue.cbz"), Path::new("/tmp/issue"))?;
/// backend.pack(Path::new("/tmp/issue"), Path::new("/comics/issue-repacked.cbz"))?;
/// # Ok(())
/// # }
/// ```
pub trait ArchiveBackend: Send + Sync {
    /// The container format this backend reads and writes.
    fn format(&self) -> Format;

    /// Extract every member of `container` into `target`.
    ///
    /// Returns [`ExtractFailed`](crate::error::ErrorKind::ExtractFailed) if
    /// the reader tool is missing, exits non-zero, or the container can't be
    /// read. The tool's diagnostic output is kept in the error.
    fn extract(&self, container: &Path, target: &Path) -> Result<()>;

    /// Build a new container at `container` from the contents of `source`.
    ///
    /// `container` must not exist yet: some archivers append to an existing
    /// archive instead of replacing it. Returns
    /// [`PackFailed`](crate::error::ErrorKind::PackFailed) on failure.
    fn pack(&self, source: &Path, container: &Path) -> Result<()>;
}

/// The backend to use for each [`Format`].
///
/// Cheap to clone: backends are shared behind [`Arc`]s.
///
/// # Example
///
/// ```
/// use comix_archive::{Backends, Format, ToolConfig};
///
/// let backends = Backends::from_config(&ToolConfig::default());
/// assert_eq!(backends.get(Format::Cbr).format(), Format::Cbr);
/// ```
#[derive(Clone)]
pub struct Backends {
    cbz: BackendHandle,
    cbr: BackendHandle,
    pdf: BackendHandle,
}

impl Backends {
    /// Build the tool-backed registry for the configured programs.
    pub fn from_config(tools: &ToolConfig) -> Self {
        Self {
            cbz: Arc::new(ZipBackend::new(&tools.zip, &tools.unzip)),
            cbr: Arc::new(RarBackend::new(&tools.rar, &tools.unrar)),
            pdf: Arc::new(PdfBackend::new(&tools.pdf_pack, &tools.pdf_extract)),
        }
    }

    /// Replace the backend used for `backend.format()`.
    pub fn with_backend(mut self, backend: impl ArchiveBackend + 'static) -> Self {
        self.set(Arc::new(backend));
        self
    }

    /// Replace the backend used for `backend.format()` with a shared handle.
    pub fn set(&mut self, backend: BackendHandle) {
        match backend.format() {
            Format::Cbz => self.cbz = backend,
            Format::Cbr => self.cbr = backend,
            Format::Pdf => self.pdf = backend,
        }
    }

    /// The backend for `format`.
    pub fn get(&self, format: Format) -> &BackendHandle {
        match format {
            Format::Cbz => &self.cbz,
            Format::Cbr => &self.cbr,
            Format::Pdf => &self.pdf,
        }
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self::from_config(&ToolConfig::default())
    }
}

impl Debug for Backends {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_list().entries(Format::ALL.iter().map(|format| self.get(*format).format())).finish()
    }
}

/// Tools that run inside the source directory need the container path to
/// stay valid after the working directory changes.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::Io)
}

/// Fail with `NothingToPack` (as `PackFailed`) when `source` holds no files.
/// Archivers report an empty source with their own, less useful, diagnostic.
pub(crate) fn ensure_not_empty(source: &Path, container: &Path) -> Result<()> {
    let files = list_files(source).map_err(|e| ErrorKind::pack_failed(e, container))?;
    if files.is_empty() {
        return Err(ErrorKind::pack_failed(exn::Exn::from(ErrorKind::NothingToPack), container));
    }
    Ok(())
}

/// Tools that write into a directory given as a path prefix need it to exist.
pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).or_raise(|| ErrorKind::Io)
}
