use crate::Format;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Format {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl Format {
    /// Returns the file extension for this format, without the leading dot.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Returns the short name for configuration (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cbz => "cbz",
            Format::Cbr => "cbr",
            Format::Pdf => "pdf",
        }
    }

    /// Whether containers of this format carry a `ComicInfo.xml` descriptor.
    ///
    /// PDF containers never read or write one.
    #[inline]
    #[must_use]
    pub fn supports_descriptor(&self) -> bool {
        matches!(self, Format::Cbz | Format::Cbr)
    }

    /// Verify that `bytes` start with the expected signature for this format.
    ///
    /// Useful for cross-checking a format resolved from a file extension
    /// against actual file contents (a `.cbr` that is really a zip is common).
    #[must_use]
    pub fn check_magic_bytes(&self, bytes: &[u8]) -> bool {
        Self::from_magic_bytes(bytes) == Some(*self)
    }
}
