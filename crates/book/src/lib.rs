//! Comic books as editable objects.
//!
//! A [`Book`] wraps one cbz, cbr or pdf container. Opening it extracts the
//! members into a private working directory through the matching
//! [`ArchiveBackend`](comix_archive::ArchiveBackend); closing it packs them
//! back, but only if something changed. While open, the book exposes its
//! members and its `ComicInfo.xml` metadata, and can be converted to another
//! container format.
//!
//! [`scan`] finds candidate containers beneath a directory.

mod book;
pub mod error;
mod options;
mod path;
mod scan;
mod snapshot;

pub use crate::book::Book;
pub use crate::options::BookOptions;
pub use crate::scan::{Scanner, scan};
pub use comix_archive::{Backends, Format};
pub use comix_metadata::{ComicInfo, Tag};
