use crate::error::{ErrorKind, Result};
use crate::tag::{self, Tag};
use crate::xml::{self, Element};
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const ROOT: &str = "ComicInfo";
const XMLNS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// An in-memory `ComicInfo.xml` record.
///
/// Values are kept as strings, keyed by element name. Elements the record
/// doesn't understand (unknown names, nested structures like `<Pages>`,
/// root attributes) are carried along untouched, so a load/save cycle only
/// changes what was explicitly set.
///
/// # Example
///
/// ```
/// use comix_metadata::{ComicInfo, Tag};
///
/// let mut info = ComicInfo::new();
/// info.set_series("Calvin and Hobbes");
/// info.set_year(1987);
/// info.set("page_count", "128")?;
///
/// assert_eq!(info.get(Tag::Series), Some("Calvin and Hobbes"));
/// assert_eq!(info.page_count(), Some(128));
/// assert!(info.is_dirty());
/// # Ok::<(), comix_metadata::error::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicInfo {
    root: Element,
    dirty: bool,
}

impl Default for ComicInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ComicInfo {
    /// An empty record with the standard schema namespace attributes.
    pub fn new() -> Self {
        let root = Element::new(ROOT).with_attribute("xmlns:xsd", XMLNS_XSD).with_attribute("xmlns:xsi", XMLNS_XSI);
        Self { root, dirty: false }
    }

    /// Parse a descriptor document.
    ///
    /// Fails with [`Malformed`](ErrorKind::Malformed) if the bytes aren't
    /// well-formed XML or the root element isn't `ComicInfo`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = xml::parse(bytes)?;
        if root.name != ROOT {
            exn::bail!(ErrorKind::Malformed(format!("unexpected root element <{}>", root.name)));
        }
        Ok(Self { root, dirty: false })
    }

    /// Read the descriptor at `path`. A missing file is an empty record.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Self::parse(&bytes),
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                tracing::debug!("No descriptor present, starting empty");
                Ok(Self::new())
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Io),
        }
    }

    /// Serialize the record as a standalone XML document.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        xml::write(&self.root)
    }

    /// Write the record to `path`, replacing any existing file, and mark it
    /// clean.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let bytes = self.to_xml()?;
        std::fs::write(path, bytes).or_raise(|| ErrorKind::Io)?;
        tracing::debug!(fields = self.len(), "Saved descriptor");
        self.dirty = false;
        Ok(())
    }

    /// The value of a top-level field, or `None` if absent or empty.
    ///
    /// Known tags may be named by schema name or in snake case.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = tag::canonical(name.as_ref());
        self.field(name).map(|e| e.text.as_str()).filter(|text| !text.is_empty())
    }

    /// The value of a field parsed as `T`. Unparseable values read as absent.
    pub fn get_as<T: FromStr>(&self, name: impl AsRef<str>) -> Option<T> {
        self.get(name)?.trim().parse().ok()
    }

    /// Set a field, creating it if needed.
    ///
    /// Returns [`InvalidTag`](ErrorKind::InvalidTag) when `name` isn't a
    /// usable element name, and [`NotAField`](ErrorKind::NotAField) when an
    /// unknown name belongs to a nested structure. Known tags are text by
    /// schema, so nested content under one is replaced. Setting a field to
    /// its current value doesn't mark the record dirty.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Result<()> {
        let name = name.as_ref();
        if let Some(tag) = Tag::from_name(name) {
            self.set_known(tag, value.into());
            return Ok(());
        }
        if !tag::is_valid_name(name) {
            exn::bail!(ErrorKind::InvalidTag(name.to_string()));
        }
        if self.root.children.iter().any(|e| e.name == name && !e.is_leaf()) {
            exn::bail!(ErrorKind::NotAField(name.to_string()));
        }
        self.store(name, value.into());
        Ok(())
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, name: impl AsRef<str>) -> Option<String> {
        let name = tag::canonical(name.as_ref());
        let index = self.root.children.iter().position(|e| e.name == name && e.is_leaf())?;
        self.dirty = true;
        Some(self.root.children.remove(index).text)
    }

    /// Top-level text fields in document order, skipping empty ones and
    /// nested structures.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.root
            .children
            .iter()
            .filter(|e| e.is_leaf() && !e.text.is_empty())
            .map(|e| (e.name.as_str(), e.text.as_str()))
    }

    /// Number of fields [`iter`](Self::iter) yields.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether the record changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn field(&self, name: &str) -> Option<&Element> {
        self.root.children.iter().find(|e| e.name == name && e.is_leaf())
    }

    fn set_known(&mut self, tag: Tag, value: String) {
        self.store(tag.name(), value);
    }

    /// Write `value` into the first element called `name`, dropping any
    /// children it had, or append a new one. `name` must be a valid name.
    fn store(&mut self, name: &str, value: String) {
        match self.root.children.iter_mut().find(|e| e.name == name) {
            Some(existing) if existing.is_leaf() && existing.text == value => {},
            Some(existing) => {
                existing.children.clear();
                existing.text = value;
                self.dirty = true;
            },
            None => {
                let mut element = Element::new(name);
                element.text = value;
                self.root.children.push(element);
                self.dirty = true;
            },
        }
    }
}

macro_rules! text_accessors {
    ($($get:ident, $set:ident => $tag:ident;)*) => {
        impl ComicInfo {
            $(
                #[doc = concat!("The `", stringify!($tag), "` field.")]
                pub fn $get(&self) -> Option<&str> {
                    self.get(Tag::$tag)
                }

                #[doc = concat!("Set the `", stringify!($tag), "` field.")]
                pub fn $set(&mut self, value: impl Into<String>) {
                    self.set_known(Tag::$tag, value.into());
                }
            )*
        }
    };
}

macro_rules! integer_accessors {
    ($($get:ident, $set:ident => $tag:ident;)*) => {
        impl ComicInfo {
            $(
                #[doc = concat!("The `", stringify!($tag), "` field, if present and numeric.")]
                pub fn $get(&self) -> Option<i32> {
                    self.get_as(Tag::$tag)
                }

                #[doc = concat!("Set the `", stringify!($tag), "` field.")]
                pub fn $set(&mut self, value: i32) {
                    self.set_known(Tag::$tag, value.to_string());
                }
            )*
        }
    };
}

text_accessors! {
    title, set_title => Title;
    series, set_series => Series;
    number, set_number => Number;
    alternate_series, set_alternate_series => AlternateSeries;
    alternate_number, set_alternate_number => AlternateNumber;
    story_arc, set_story_arc => StoryArc;
    series_group, set_series_group => SeriesGroup;
    summary, set_summary => Summary;
    notes, set_notes => Notes;
    writer, set_writer => Writer;
    penciller, set_penciller => Penciller;
    inker, set_inker => Inker;
    colorist, set_colorist => Colorist;
    letterer, set_letterer => Letterer;
    cover_artist, set_cover_artist => CoverArtist;
    editor, set_editor => Editor;
    publisher, set_publisher => Publisher;
    imprint, set_imprint => Imprint;
    genre, set_genre => Genre;
    web, set_web => Web;
    language_iso, set_language_iso => LanguageIso;
    format, set_format => Format;
    age_rating, set_age_rating => AgeRating;
    black_and_white, set_black_and_white => BlackAndWhite;
    manga, set_manga => Manga;
    characters, set_characters => Characters;
    teams, set_teams => Teams;
    locations, set_locations => Locations;
    scan_information, set_scan_information => ScanInformation;
}

integer_accessors! {
    count, set_count => Count;
    volume, set_volume => Volume;
    alternate_count, set_alternate_count => AlternateCount;
    year, set_year => Year;
    month, set_month => Month;
    day, set_day => Day;
    page_count, set_page_count => PageCount;
}
