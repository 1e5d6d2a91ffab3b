use crate::Format;
use crate::error::{Error, ErrorKind, Result};
use std::{path::Path, str::FromStr};

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const RAR_MAGIC: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];
const PDF_MAGIC: [u8; 5] = *b"%PDF-";

impl FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "cbz" | "zip" => Ok(Format::Cbz),
            "cbr" | "rar" => Ok(Format::Cbr),
            "pdf" => Ok(Format::Pdf),
            _ => exn::bail!(ErrorKind::NotSupported(s.to_string())),
        }
    }
}

impl Format {
    /// Resolve the container format from a file extension.
    ///
    /// The extension is authoritative: content is never sniffed here, since
    /// files are routinely renamed as part of conversion workflows. Only the
    /// container extensions (`cbz`, `cbr`, `pdf`) are accepted, in any case.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        match extension.to_lowercase().as_str() {
            "cbz" => Ok(Format::Cbz),
            "cbr" => Ok(Format::Cbr),
            "pdf" => Ok(Format::Pdf),
            _ => exn::bail!(ErrorKind::NotSupported(path.display().to_string())),
        }
    }

    /// Whether `path` carries one of the supported container extensions.
    #[must_use]
    pub fn is_supported_path(path: impl AsRef<Path>) -> bool {
        Self::from_path(path).is_ok()
    }

    /// Detect the container format from magic bytes.
    ///
    /// Returns `None` if no signature matches or if the input is too short.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return Some(Format::Cbz);
        }
        if bytes.starts_with(&RAR_MAGIC) {
            return Some(Format::Cbr);
        }
        if bytes.starts_with(&PDF_MAGIC) {
            return Some(Format::Pdf);
        }
        None
    }
}
