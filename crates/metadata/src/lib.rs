//! ComicRack `ComicInfo.xml` metadata.
//!
//! [`ComicInfo`] holds the descriptor embedded in cbz/cbr containers as a
//! set of string fields keyed by element name, with typed accessors for the
//! known [`Tag`] vocabulary. Anything the model doesn't know about survives
//! a load/save round trip unchanged.

pub mod error;
mod record;
mod tag;
mod xml;

pub use crate::record::ComicInfo;
pub use crate::tag::{Tag, TagKind};
