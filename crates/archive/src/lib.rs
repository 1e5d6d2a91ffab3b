//! Comic book containers backed by external archivers.
//!
//! This crate knows about the three container formats comics are shipped in
//! and how to move their members in and out of a directory:
//!
//! - **Format resolution** from file extensions ([`Format::from_path`]), with
//!   magic-byte sniffing ([`Format::from_magic_bytes`]) available for
//!   diagnostics only. The extension is always authoritative.
//! - **Backends** implementing [`ArchiveBackend`] for each format by shelling
//!   out to `zip`/`unzip`, `rar`/`unrar` and `pdfimages`/`img2pdf`.
//! - A **registry** ([`Backends`]) that maps formats to backend handles and
//!   can have individual backends swapped out, e.g. for the in-memory
//!   `MockBackend` (requires the `mock` feature).
//!
//! Everything is synchronous: each call blocks until the child process exits.

pub mod backend;
mod config;
mod construct;
pub mod error;
mod tool;
mod util;
mod walk;

pub use crate::backend::{ArchiveBackend, Backends, PdfBackend, RarBackend, ZipBackend};
#[cfg(feature = "mock")]
pub use crate::backend::MockBackend;
pub use crate::config::ToolConfig;
pub use crate::walk::list_files;
use std::sync::Arc;

/// File name of the embedded metadata descriptor in cbz/cbr containers.
pub const DESCRIPTOR_FILENAME: &str = "ComicInfo.xml";

/// Shared handle to a backend, as stored in [`Backends`].
pub type BackendHandle = Arc<dyn ArchiveBackend>;

/// A supported comic container format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Zip archive (.cbz)
    Cbz,
    /// Rar archive (.cbr)
    Cbr,
    /// PDF document (.pdf)
    Pdf,
}

impl Format {
    /// Every supported format, in a stable order.
    pub const ALL: [Format; 3] = [Format::Cbz, Format::Cbr, Format::Pdf];
}
