use serde::{Deserialize, Serialize};

/// Names (or paths) of the external programs used by the backends.
///
/// Each entry is resolved through `PATH` at first use, so both a bare
/// program name and an absolute path work.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Zip writer
    pub zip: String,
    /// Zip reader
    pub unzip: String,
    /// Rar writer
    pub rar: String,
    /// Rar reader
    pub unrar: String,
    /// PDF image extractor (poppler's `pdfimages`)
    pub pdf_extract: String,
    /// Images to PDF writer
    pub pdf_pack: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            zip: "zip".to_string(),
            unzip: "unzip".to_string(),
            rar: "rar".to_string(),
            unrar: "unrar".to_string(),
            pdf_extract: "pdfimages".to_string(),
            pdf_pack: "img2pdf".to_string(),
        }
    }
}
