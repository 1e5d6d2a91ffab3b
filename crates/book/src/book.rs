use crate::error::{ErrorKind, Result};
use crate::options::BookOptions;
use crate::path::validate;
use crate::snapshot::Snapshot;
use comix_archive::{Backends, DESCRIPTOR_FILENAME, Format, list_files};
use comix_metadata::ComicInfo;
use exn::{OptionExt, ResultExt};
use std::ffi::OsString;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::instrument;

const WORKING_DIR_PREFIX: &str = "comix-";
const STAGING_DIR_PREFIX: &str = ".comix-";

/// State that only exists while a book is open.
///
/// Dropping it removes the working directory, so there is no way to hold
/// one without the other.
struct Session {
    working_dir: TempDir,
    format: Format,
    metadata: ComicInfo,
    /// Working directory state as of the last open or pack.
    snapshot: Snapshot,
    /// Members were written or removed through the book since the last pack.
    touched: bool,
}

impl Session {
    fn dir(&self) -> &Path {
        self.working_dir.path()
    }

    /// Write the descriptor if it has unsaved changes and `format` can hold
    /// one. Returns whether anything was written.
    fn save_metadata(&mut self, format: Format) -> Result<bool> {
        if !self.metadata.is_dirty() {
            return Ok(false);
        }
        if !format.supports_descriptor() {
            tracing::debug!(%format, "Format has no descriptor, metadata changes not written");
            return Ok(false);
        }
        let path = self.working_dir.path().join(DESCRIPTOR_FILENAME);
        self.metadata.save(&path).map_err(ErrorKind::metadata)?;
        Ok(true)
    }

    fn changed(&self) -> Result<bool> {
        Ok(self.touched || Snapshot::take(self.dir())? != self.snapshot)
    }

    fn discard(self) {
        let path = self.working_dir.path().to_path_buf();
        if let Err(err) = self.working_dir.close() {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove working directory");
        }
    }
}

/// A comic book container on disk.
///
/// A book starts closed. [`open`](Self::open) extracts the container into a
/// private temporary working directory and loads its metadata; while open,
/// members and metadata can be read and changed. [`close`](Self::close)
/// writes changes back into the container and removes the working directory.
/// [`convert_to`](Self::convert_to) repacks the open book as another format.
///
/// Two books must never be open on the same container path at the same
/// time: both would replace the file when closing. This isn't checked.
///
/// # Example
///
/// ```no_run
/// use comix_book::{Book, Format};
///
/// # fn example() -> comix_book::error::Result<()> {
/// let mut book = Book::new("/comics/Calvin and Hobbes 01.cbr");
/// book.scoped(|book| {
///     book.metadata_mut()?.set_series("Calvin and Hobbes");
///     book.convert_to(Format::Cbz)?;
///     Ok(())
/// })?;
/// assert_eq!(book.path().extension().unwrap(), "cbz");
/// # Ok(())
/// # }
/// ```
pub struct Book {
    path: PathBuf,
    backends: Backends,
    options: BookOptions,
    session: Option<Session>,
}

impl Book {
    /// A closed book using the default external tools.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_backends(path, Backends::default())
    }

    /// A closed book using the given backends.
    pub fn with_backends(path: impl Into<PathBuf>, backends: Backends) -> Self {
        Self {
            path: path.into(),
            backends,
            options: BookOptions::default(),
            session: None,
        }
    }

    pub fn with_options(mut self, options: BookOptions) -> Self {
        self.options = options;
        self
    }

    /// Where the container lives. Changes when the book is converted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The container format: the open session's format, otherwise whatever
    /// the path's extension says.
    pub fn format(&self) -> Result<Format> {
        match &self.session {
            Some(session) => Ok(session.format),
            None => Format::from_path(&self.path).map_err(ErrorKind::archive),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Extract the container into a fresh working directory and load its
    /// metadata.
    ///
    /// Either everything succeeds or the book stays closed with nothing
    /// left on disk. A descriptor that isn't valid XML is ignored (with a
    /// warning) rather than failing the open.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            exn::bail!(ErrorKind::AlreadyOpen(self.path.clone()));
        }
        let format = Format::from_path(&self.path).map_err(ErrorKind::archive)?;
        if let Some(sniffed) = sniff(&self.path)
            && sniffed != format
        {
            tracing::warn!(%format, %sniffed, "Container content doesn't match its extension");
        }

        let working_dir = self.create_working_dir()?;
        self.backends.get(format).extract(&self.path, working_dir.path()).map_err(ErrorKind::archive)?;
        let metadata = load_metadata(format, working_dir.path())?;
        let snapshot = Snapshot::take(working_dir.path())?;
        tracing::info!(%format, members = snapshot.len(), "Opened book");
        self.session = Some(Session {
            working_dir,
            format,
            metadata,
            snapshot,
            touched: false,
        });
        Ok(())
    }

    /// Write changes back into the container and remove the working
    /// directory.
    ///
    /// Unsaved metadata is written to the descriptor first. The container is
    /// only repacked when something in the working directory changed since
    /// it was opened (or last converted); the new container replaces the old
    /// one only once it has been built successfully. The working directory
    /// is removed and the book closed even when packing fails.
    ///
    /// A book left with no members can't be written back: closing fails
    /// with [`PackFailed`](ErrorKind::PackFailed) ("no packable content")
    /// and the container keeps its previous content. Delete the file
    /// instead.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn close(&mut self) -> Result<()> {
        let mut session = self.session.take().ok_or_raise(|| ErrorKind::NotOpen(self.path.clone()))?;
        let result = self.commit(&mut session);
        session.discard();
        match &result {
            Ok(()) => tracing::info!("Closed book"),
            Err(err) => tracing::warn!(error = %err, "Closed book without saving changes"),
        }
        result
    }

    fn commit(&self, session: &mut Session) -> Result<()> {
        let saved = session.save_metadata(session.format)?;
        if !saved && !session.changed()? {
            tracing::debug!("No changes, container left as is");
            return Ok(());
        }
        self.pack_into(session, session.format, &self.path)
    }

    /// Repack the open book's content as `format`, next to the current
    /// container, and switch the book over to it. Returns the new path.
    ///
    /// The new container is `path` with the new format's extension; an
    /// existing file there is replaced. The old container is left untouched.
    /// Unsaved metadata is written into the new container when the format
    /// can hold a descriptor; one is never created otherwise. On failure the
    /// book stays open with its previous format and path.
    #[instrument(skip_all, fields(path = %self.path.display(), %format))]
    pub fn convert_to(&mut self, format: Format) -> Result<PathBuf> {
        let mut session = self.session.take().ok_or_raise(|| ErrorKind::NotOpen(self.path.clone()))?;
        let result = self.convert_session(&mut session, format);
        self.session = Some(session);
        result
    }

    fn convert_session(&mut self, session: &mut Session, format: Format) -> Result<PathBuf> {
        if session.format == format {
            tracing::debug!("Already in the requested format");
            return Ok(self.path.clone());
        }
        let target = self.path.with_extension(format.extension());
        session.save_metadata(format)?;
        self.pack_into(session, format, &target)?;

        tracing::info!(from = %session.format, to = %format, target = %target.display(), "Converted book");
        session.format = format;
        session.snapshot = Snapshot::take(session.dir())?;
        session.touched = false;
        self.path = target.clone();
        Ok(target)
    }

    /// Pack the working directory into a staging directory beside `target`,
    /// then move the result over `target`.
    fn pack_into(&self, session: &Session, format: Format, target: &Path) -> Result<()> {
        let file_name = target.file_name().ok_or_raise(|| ErrorKind::InvalidPath(target.to_path_buf()))?;
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir_in(parent)
            .or_raise(|| ErrorKind::Io)?;
        let staged = staging.path().join(file_name);
        self.backends.get(format).pack(session.dir(), &staged).map_err(ErrorKind::archive)?;

        if self.options.backup && target.exists() {
            let backup = backup_path(target);
            tracing::debug!(backup = %backup.display(), "Keeping previous container");
            fs::rename(target, &backup).or_raise(|| ErrorKind::Io)?;
        }
        fs::rename(&staged, target).or_raise(|| ErrorKind::Io)?;
        Ok(())
    }

    fn create_working_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKING_DIR_PREFIX);
        let dir = match &self.options.temp_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.or_raise(|| ErrorKind::Io)
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_raise(|| ErrorKind::NotOpen(self.path.clone()))
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_raise(|| ErrorKind::NotOpen(self.path.clone()))
    }

    /// The working directory of the open book.
    ///
    /// Files changed here directly are picked up on close.
    pub fn working_dir(&self) -> Result<&Path> {
        Ok(self.session()?.dir())
    }

    pub fn metadata(&self) -> Result<&ComicInfo> {
        Ok(&self.session()?.metadata)
    }

    /// Mutable metadata. Changes are written when the book is closed or
    /// converted.
    pub fn metadata_mut(&mut self) -> Result<&mut ComicInfo> {
        Ok(&mut self.session_mut()?.metadata)
    }

    /// Every member, as sorted paths relative to the working directory.
    pub fn members(&self) -> Result<Vec<PathBuf>> {
        list_files(self.session()?.dir()).map_err(ErrorKind::archive)
    }

    pub fn read_member(&self, member: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = self.session()?.dir().join(validate(member)?);
        fs::read(path).or_raise(|| ErrorKind::Io)
    }

    /// Create or overwrite a member, creating parent directories as needed.
    pub fn write_member(&mut self, member: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<()> {
        let member = validate(member)?;
        let session = self.session_mut()?;
        let path = session.dir().join(&member);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        }
        fs::write(&path, data).or_raise(|| ErrorKind::Io)?;
        session.touched = true;
        tracing::debug!(member = %member.display(), "Wrote member");
        Ok(())
    }

    pub fn remove_member(&mut self, member: impl AsRef<Path>) -> Result<()> {
        let member = validate(member)?;
        let session = self.session_mut()?;
        fs::remove_file(session.dir().join(&member)).or_raise(|| ErrorKind::Io)?;
        session.touched = true;
        tracing::debug!(member = %member.display(), "Removed member");
        Ok(())
    }

    /// Copy a member out of the book. If `destination` is an existing
    /// directory the member's file name is kept. Returns the written path.
    pub fn extract_member(&self, member: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let member = validate(member)?;
        let source = self.session()?.dir().join(&member);
        let mut destination = destination.as_ref().to_path_buf();
        if destination.is_dir() {
            let name = member.file_name().ok_or_raise(|| ErrorKind::InvalidPath(member.clone()))?;
            destination.push(name);
        }
        fs::copy(&source, &destination).or_raise(|| ErrorKind::Io)?;
        Ok(destination)
    }

    /// Open the book, run `f`, and close it again whatever `f` returns.
    ///
    /// An error from `f` takes precedence over one from closing; a close
    /// failure after `f` succeeded is returned as is. If `f` closes the book
    /// itself, nothing more is done.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Book) -> Result<T>) -> Result<T> {
        self.open()?;
        let result = f(self);
        let closed = match self.is_open() {
            true => self.close(),
            false => Ok(()),
        };
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Close failed after an earlier error");
                Err(err)
            },
        }
    }
}

impl Drop for Book {
    fn drop(&mut self) {
        if self.session.is_none() {
            return;
        }
        if std::thread::panicking() {
            if let Some(session) = self.session.take() {
                session.discard();
            }
            return;
        }
        if let Err(err) = self.close() {
            tracing::error!(error = %err, path = %self.path.display(), "Failed to close book on drop");
        }
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("backends", &self.backends)
            .field("options", &self.options)
            .finish()
    }
}

fn load_metadata(format: Format, dir: &Path) -> Result<ComicInfo> {
    if !format.supports_descriptor() {
        return Ok(ComicInfo::new());
    }
    match ComicInfo::load(&dir.join(DESCRIPTOR_FILENAME)) {
        Ok(metadata) => Ok(metadata),
        Err(err) if matches!(&*err, comix_metadata::error::ErrorKind::Malformed(_)) => {
            tracing::warn!(error = %err, "Ignoring malformed descriptor");
            Ok(ComicInfo::new())
        },
        Err(err) => Err(ErrorKind::metadata(err)),
    }
}

/// The format the first bytes of `path` look like, if recognisable.
fn sniff(path: &Path) -> Option<Format> {
    let mut head = Vec::with_capacity(8);
    fs::File::open(path).ok()?.take(8).read_to_end(&mut head).ok()?;
    Format::from_magic_bytes(&head)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}
