use std::fmt::{Display, Formatter, Result as FmtResult};

/// How a known tag's value is meant to be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Text,
    Integer,
}

macro_rules! tags {
    ($($variant:ident => $name:literal, $kind:ident;)*) => {
        /// The known ComicRack `ComicInfo.xml` elements.
        ///
        /// Element names outside this vocabulary are still readable and
        /// writable through [`ComicInfo::get`](crate::ComicInfo::get) and
        /// [`ComicInfo::set`](crate::ComicInfo::set); they just have no
        /// typed accessor.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant,)*
        }

        impl Tag {
            /// Every known tag, in schema order.
            pub const ALL: &'static [Tag] = &[$(Tag::$variant,)*];

            /// The element name used in the descriptor file.
            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Tag::$variant => $name,)*
                }
            }

            #[must_use]
            pub fn kind(&self) -> TagKind {
                match self {
                    $(Tag::$variant => TagKind::$kind,)*
                }
            }
        }
    };
}

tags! {
    Title => "Title", Text;
    Series => "Series", Text;
    Number => "Number", Text;
    Count => "Count", Integer;
    Volume => "Volume", Integer;
    AlternateSeries => "AlternateSeries", Text;
    AlternateNumber => "AlternateNumber", Text;
    AlternateCount => "AlternateCount", Integer;
    StoryArc => "StoryArc", Text;
    SeriesGroup => "SeriesGroup", Text;
    Summary => "Summary", Text;
    Notes => "Notes", Text;
    Year => "Year", Integer;
    Month => "Month", Integer;
    Day => "Day", Integer;
    Writer => "Writer", Text;
    Penciller => "Penciller", Text;
    Inker => "Inker", Text;
    Colorist => "Colorist", Text;
    Letterer => "Letterer", Text;
    CoverArtist => "CoverArtist", Text;
    Editor => "Editor", Text;
    Publisher => "Publisher", Text;
    Imprint => "Imprint", Text;
    Genre => "Genre", Text;
    Web => "Web", Text;
    PageCount => "PageCount", Integer;
    LanguageIso => "LanguageISO", Text;
    Format => "Format", Text;
    AgeRating => "AgeRating", Text;
    BlackAndWhite => "BlackAndWhite", Text;
    Manga => "Manga", Text;
    Characters => "Characters", Text;
    Teams => "Teams", Text;
    Locations => "Locations", Text;
    ScanInformation => "ScanInformation", Text;
}

impl Tag {
    /// Look up a known tag by its schema name (`PageCount`) or snake case
    /// name (`page_count`), ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted: String = name.chars().filter(|c| *c != '_').collect();
        Tag::ALL.iter().copied().find(|tag| tag.name().eq_ignore_ascii_case(&wanted))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &'static str {
        self.name()
    }
}

/// Canonical element name for `name`: the schema spelling for known tags,
/// `name` verbatim otherwise.
pub(crate) fn canonical(name: &str) -> &str {
    match Tag::from_name(name) {
        Some(tag) => tag.name(),
        None => name,
    }
}

/// Whether `name` can be used as an XML element name.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}
