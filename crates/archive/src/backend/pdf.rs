//! PDF containers through poppler's `pdfimages` and `img2pdf`.
//!
//! The two directions are not symmetric. Extraction works for any PDF: every
//! embedded image is written out, named by page. Packing only works for
//! image content, one image per page, and is best-effort; a directory with
//! no images fails with [`NothingToPack`](crate::error::ErrorKind::NothingToPack)
//! wrapped in `PackFailed`. Anything that isn't an image (including the
//! `ComicInfo.xml` descriptor) is left out. Images `img2pdf` can't embed
//! (JBIG2 and CCITT streams from `pdfimages -all`, netpbm, bmp, webp) fail
//! the pack with [`Unpackable`](crate::error::ErrorKind::Unpackable) instead
//! of silently losing pages.

use super::{ArchiveBackend, ensure_dir};
use crate::Format;
use crate::error::{ErrorKind, Result};
use crate::tool::Invocation;
use crate::walk::list_files;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Prefix handed to `pdfimages`; it writes `image-PPP-NNN.ext` files.
const EXTRACT_PREFIX: &str = "image";
/// Extensions of images `img2pdf` is given when building a PDF.
const PACKABLE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "jp2", "tif", "tiff"];
/// Image encodings `img2pdf` can't embed as they are.
const UNPACKABLE_EXTENSIONS: [&str; 10] = [
    "jb2e", "jb2g", "ccitt", "params", "pbm", "pgm", "ppm", "pnm", "bmp", "webp",
];

/// PDF comic containers (`.pdf`).
#[derive(Debug, Clone)]
pub struct PdfBackend {
    writer: String,
    reader: String,
}

impl PdfBackend {
    /// Create a backend using the given writer (`img2pdf`) and image
    /// extractor (`pdfimages`) programs.
    pub fn new(writer: impl Into<String>, reader: impl Into<String>) -> Self {
        Self {
            writer: writer.into(),
            reader: reader.into(),
        }
    }
}

impl Default for PdfBackend {
    fn default() -> Self {
        Self::new("img2pdf", "pdfimages")
    }
}

impl ArchiveBackend for PdfBackend {
    fn format(&self) -> Format {
        Format::Pdf
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn extract(&self, container: &Path, target: &Path) -> Result<()> {
        ensure_dir(target).map_err(|e| ErrorKind::extract_failed(e, container))?;
        // -all: keep the native image encoding, -p: include the page number.
        Invocation::new(&self.reader)
            .args(["-all", "-p"])
            .arg(container)
            .arg(target.join(EXTRACT_PREFIX))
            .run()
            .map_err(|e| ErrorKind::extract_failed(e, container))?;
        let pages = normalize_page_names(target).map_err(|e| ErrorKind::extract_failed(e, container))?;
        tracing::debug!(images = pages, "Extracted PDF images");
        Ok(())
    }

    #[instrument(skip_all, fields(container = %container.display()))]
    fn pack(&self, source: &Path, container: &Path) -> Result<()> {
        let images = packable_images(source).map_err(|e| ErrorKind::pack_failed(e, container))?;
        if images.is_empty() {
            let err = exn::Exn::from(ErrorKind::NothingToPack);
            return Err(ErrorKind::pack_failed(err, container));
        }
        tracing::debug!(images = images.len(), "Packing images into PDF");
        Invocation::new(&self.writer)
            .arg("-o")
            .arg(container)
            .args(&images)
            .run()
            .map_err(|e| ErrorKind::pack_failed(e, container))?;
        Ok(())
    }
}

/// Every packable image beneath `source`, sorted by relative path.
///
/// Fails with [`Unpackable`](ErrorKind::Unpackable) on the first image in an
/// encoding that can't be packed; other files are skipped.
pub(crate) fn packable_images(source: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for path in list_files(source)? {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase) else {
            continue;
        };
        if PACKABLE_EXTENSIONS.contains(&ext.as_str()) {
            images.push(source.join(path));
        } else if UNPACKABLE_EXTENSIONS.contains(&ext.as_str()) {
            exn::bail!(ErrorKind::Unpackable(path));
        }
    }
    Ok(images)
}

/// Parse `image-PPP-NNN` (the stem `pdfimages -p` produces) into its page
/// and running image number.
fn parse_extracted_stem(stem: &str) -> Option<(u32, u32)> {
    let rest = stem.strip_prefix(EXTRACT_PREFIX)?.strip_prefix('-')?;
    let (page, number) = rest.split_once('-')?;
    Some((page.parse().ok()?, number.parse().ok()?))
}

/// Rename `pdfimages` output to `image_PPPP_NNN.ext`: four-digit page, then
/// a three-digit index counting from 1 within that page. Lexical order of
/// the result is page order. Files sharing a stem (a JBIG2 `.jb2e`/`.jb2g`
/// pair, CCITT `.ccitt`/`.params`) keep sharing one. Files that don't look
/// like `pdfimages` output are left alone. Returns the number of renamed
/// files.
pub(crate) fn normalize_page_names(target: &Path) -> Result<usize> {
    let mut extracted: Vec<(u32, u32, PathBuf)> = list_files(target)?
        .into_iter()
        .filter(|path| path.parent().is_some_and(|p| p.as_os_str().is_empty()))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let (page, number) = parse_extracted_stem(stem)?;
            Some((page, number, path))
        })
        .collect();
    extracted.sort();

    let mut current = None;
    let mut index = 0;
    for (page, number, path) in &extracted {
        match current {
            Some((p, n)) if p == *page && n == *number => {},
            Some((p, _)) if p == *page => index += 1,
            _ => index = 1,
        }
        current = Some((*page, *number));
        let mut name = format!("{EXTRACT_PREFIX}_{page:04}_{index:03}");
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            name.push('.');
            name.push_str(ext);
        }
        std::fs::rename(target.join(path), target.join(name)).or_raise(|| ErrorKind::Io)?;
    }
    Ok(extracted.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    #[rstest]
    #[case("image-001-000", Some((1, 0)))]
    #[case("image-012-345", Some((12, 345)))]
    #[case("image_0001_001", None)]
    #[case("image-abc-000", None)]
    #[case("cover", None)]
    fn test_parse_extracted_stem(#[case] stem: &str, #[case] expected: Option<(u32, u32)>) {
        assert_eq!(parse_extracted_stem(stem), expected);
    }

    #[test]
    fn normalizes_pdfimages_output() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["image-001-000.png", "image-002-001.jpg", "image-002-002.png", "image-010-003.png", "notes.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        assert_eq!(normalize_page_names(dir.path()).unwrap(), 4);
        assert_eq!(
            list_files(dir.path()).unwrap(),
            vec![
                PathBuf::from("image_0001_001.png"),
                PathBuf::from("image_0002_001.jpg"),
                PathBuf::from("image_0002_002.png"),
                PathBuf::from("image_0010_001.png"),
                PathBuf::from("notes.txt"),
            ]
        );
        // Content follows the rename.
        assert_eq!(fs::read(dir.path().join("image_0002_001.jpg")).unwrap(), b"image-002-001.jpg");
    }

    #[test]
    fn packable_images_skip_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("ComicInfo.xml"), b"<ComicInfo/>").unwrap();
        fs::write(dir.path().join("pages/02.PNG"), b"").unwrap();
        fs::write(dir.path().join("pages/01.jpeg"), b"").unwrap();
        let images = packable_images(dir.path()).unwrap();
        assert_eq!(images, vec![dir.path().join("pages/01.jpeg"), dir.path().join("pages/02.PNG")]);
    }

    #[test]
    fn normalizing_keeps_stem_pairs_together() {
        let dir = tempfile::tempdir().unwrap();
        let names = [
            "image-003-004.jb2e",
            "image-003-004.jb2g",
            "image-003-005.png",
            "image-004-006.ccitt",
            "image-004-006.params",
        ];
        for name in names {
            fs::write(dir.path().join(name), name).unwrap();
        }
        assert_eq!(normalize_page_names(dir.path()).unwrap(), 5);
        assert_eq!(
            list_files(dir.path()).unwrap(),
            vec![
                PathBuf::from("image_0003_001.jb2e"),
                PathBuf::from("image_0003_001.jb2g"),
                PathBuf::from("image_0003_002.png"),
                PathBuf::from("image_0004_001.ccitt"),
                PathBuf::from("image_0004_001.params"),
            ]
        );
        assert_eq!(fs::read(dir.path().join("image_0003_001.jb2g")).unwrap(), b"image-003-004.jb2g");
    }

    #[test]
    fn packable_images_include_jpeg2000_and_tiff() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["image_0001_001.jp2", "image_0002_001.png", "image_0003_001.TIF", "image_0004_001.tiff"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let images = packable_images(dir.path()).unwrap();
        assert_eq!(images.len(), 4);
        assert_eq!(images[0], dir.path().join("image_0001_001.jp2"));
        assert_eq!(images[2], dir.path().join("image_0003_001.TIF"));
    }

    #[rstest]
    #[case("image_0002_001.jb2e")]
    #[case("image_0002_001.ccitt")]
    #[case("scans/page.ppm")]
    fn pack_refuses_images_it_would_drop(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("scans")).unwrap();
        fs::write(source.join("image_0001_001.png"), b"").unwrap();
        fs::write(source.join(name), b"").unwrap();

        let err = packable_images(&source).unwrap_err();
        assert_eq!(&*err, &ErrorKind::Unpackable(PathBuf::from(name)));

        let container = dir.path().join("out.pdf");
        let backend = PdfBackend::new("comix-missing-img2pdf", "comix-missing-pdfimages");
        let err = backend.pack(&source, &container).unwrap_err();
        assert!(matches!(&*err, ErrorKind::PackFailed { reason, .. } if reason.contains(name)));
        assert!(!container.exists());
    }

    #[test]
    fn pack_without_images_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ComicInfo.xml"), b"<ComicInfo/>").unwrap();
        let container = dir.path().join("out.pdf");
        // The writer is never invoked, so a missing program doesn't matter.
        let backend = PdfBackend::new("comix-missing-img2pdf", "comix-missing-pdfimages");
        let err = backend.pack(dir.path(), &container).unwrap_err();
        assert!(matches!(&*err, ErrorKind::PackFailed { reason, .. } if reason == "no packable content"));
        assert!(!container.exists());
    }
}
