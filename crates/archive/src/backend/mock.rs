//! Tool-free backend for testing.

use super::ArchiveBackend;
use super::pdf::packable_images;
use crate::Format;
use crate::error::{ErrorKind, Result};
use crate::walk::list_files;
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const MAGIC: &str = "comix-mock";

/// Backend for testing that needs no external programs.
///
/// Containers are written as a plain-text manifest (`comix-mock:<format>`
/// header, then each member's path, length and bytes), so they survive
/// renames and copies like real archive files do. A mock only reads
/// containers written for its own format, the way `unzip` rejects a rar.
/// Packing as [`Format::Pdf`] keeps only image members, like [`PdfBackend`](super::PdfBackend).
///
/// Counters and failure switches use atomics so all methods work on `&self`
/// through a shared handle.
///
/// # Examples
///
/// ```
/// use comix_archive::{ArchiveBackend, Format, MockBackend};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let container = dir.path().join("issue.cbz");
/// MockBackend::write_container(&container, Format::Cbz, [("page01.png", b"png")])?;
///
/// let backend = MockBackend::new(Format::Cbz);
/// backend.extract(&container, &dir.path().join("out"))?;
/// assert_eq!(std::fs::read(dir.path().join("out/page01.png"))?, b"png");
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    format: Format,
    fail_extract: AtomicBool,
    fail_pack: AtomicBool,
    extracted: AtomicUsize,
    packed: AtomicUsize,
}

impl MockBackend {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            fail_extract: AtomicBool::new(false),
            fail_pack: AtomicBool::new(false),
            extracted: AtomicUsize::new(0),
            packed: AtomicUsize::new(0),
        }
    }

    /// Make every following `extract()` fail like a corrupt archive would.
    pub fn fail_extract(&self, fail: bool) {
        self.fail_extract.store(fail, Ordering::SeqCst);
    }

    /// Make every following `pack()` fail like a writer exiting non-zero.
    pub fn fail_pack(&self, fail: bool) {
        self.fail_pack.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `extract()` calls.
    pub fn extract_count(&self) -> usize {
        self.extracted.load(Ordering::SeqCst)
    }

    /// Number of successful `pack()` calls.
    pub fn pack_count(&self) -> usize {
        self.packed.load(Ordering::SeqCst)
    }

    /// Write a container fixture for `format` at `path`.
    ///
    /// Panics if a member path is absolute. If test setup is wrong, then
    /// the test should not pass.
    pub fn write_container(
        path: impl AsRef<Path>,
        format: Format,
        members: impl IntoIterator<Item = (impl Into<PathBuf>, impl AsRef<[u8]>)>,
    ) -> std::io::Result<()> {
        let mut out = format!("{MAGIC}:{format}\n").into_bytes();
        for (name, data) in members {
            let name = name.into();
            assert!(name.is_relative(), "MockBackend::write_container: absolute member {}", name.display());
            let data = data.as_ref();
            out.extend_from_slice(format!("{}\t{}\n", name.display(), data.len()).as_bytes());
            out.extend_from_slice(data);
            out.push(b'\n');
        }
        fs::write(path, out)
    }

    /// Read back the members of a container fixture, in stored order.
    pub fn read_container(path: impl AsRef<Path>) -> Option<(Format, Vec<(PathBuf, Vec<u8>)>)> {
        let bytes = fs::read(path).ok()?;
        parse(&bytes)
    }

    fn failure(program: &str) -> crate::error::Error {
        exn::Exn::from(ErrorKind::ToolFailed {
            program: program.to_string(),
            code: Some(2),
            diagnostic: "simulated failure".to_string(),
        })
    }
}

fn parse(bytes: &[u8]) -> Option<(Format, Vec<(PathBuf, Vec<u8>)>)> {
    let newline = bytes.iter().position(|b| *b == b'\n')?;
    let header = std::str::from_utf8(&bytes[..newline]).ok()?;
    let format = header.strip_prefix(MAGIC)?.strip_prefix(':')?.parse().ok()?;
    let mut members = Vec::new();
    let mut rest = &bytes[newline + 1..];
    while !rest.is_empty() {
        let newline = rest.iter().position(|b| *b == b'\n')?;
        let line = std::str::from_utf8(&rest[..newline]).ok()?;
        let (name, len) = line.rsplit_once('\t')?;
        let len: usize = len.parse().ok()?;
        let start = newline + 1;
        let data = rest.get(start..start + len)?.to_vec();
        members.push((PathBuf::from(name), data));
        rest = rest.get(start + len + 1..)?;
    }
    Some((format, members))
}

impl ArchiveBackend for MockBackend {
    fn format(&self) -> Format {
        self.format
    }

    fn extract(&self, container: &Path, target: &Path) -> Result<()> {
        if self.fail_extract.load(Ordering::SeqCst) {
            return Err(ErrorKind::extract_failed(Self::failure("mock-extract"), container));
        }
        let members = match Self::read_container(container) {
            Some((format, members)) if format == self.format => members,
            _ => {
                let err = exn::Exn::from(ErrorKind::ToolFailed {
                    program: "mock-extract".to_string(),
                    code: Some(9),
                    diagnostic: format!("{} is not a {} container", container.display(), self.format),
                });
                return Err(ErrorKind::extract_failed(err, container));
            },
        };
        for (name, data) in members {
            let path = target.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
            }
            fs::write(path, data).or_raise(|| ErrorKind::Io)?;
        }
        self.extracted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pack(&self, source: &Path, container: &Path) -> Result<()> {
        if self.fail_pack.load(Ordering::SeqCst) {
            return Err(ErrorKind::pack_failed(Self::failure("mock-pack"), container));
        }
        let files = match self.format {
            Format::Pdf => packable_images(source)
                .map_err(|e| ErrorKind::pack_failed(e, container))?
                .into_iter()
                .filter_map(|path| path.strip_prefix(source).ok().map(Path::to_path_buf))
                .collect(),
            Format::Cbz | Format::Cbr => list_files(source)?,
        };
        if files.is_empty() {
            return Err(ErrorKind::pack_failed(exn::Exn::from(ErrorKind::NothingToPack), container));
        }
        let mut members = Vec::with_capacity(files.len());
        for name in files {
            let data = fs::read(source.join(&name)).or_raise(|| ErrorKind::Io)?;
            members.push((name, data));
        }
        Self::write_container(container, self.format, members).or_raise(|| ErrorKind::Io)?;
        self.packed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
