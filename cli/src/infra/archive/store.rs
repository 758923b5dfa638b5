//! Host storage strategies behind an open archive.
//!
//! `InPlaceStore` rewrites the artifact through a temporary sibling file and
//! an atomic rename. `CopyOutStore` copies the artifact into a private
//! temporary directory, works on that copy and moves it back on commit; it
//! is used where no temporary file can be created next to the artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

use crate::domain::error::EmbedError;
use crate::infra::archive::codec::{self, Entries};

/// Concrete opening strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveStrategy {
    InPlace,
    CopyOut,
}

impl ArchiveStrategy {
    /// Create the store for `path` and read its entries.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ArchiveIo`] if the archive cannot be read or
    /// copied.
    pub fn load(self, path: &Path) -> Result<(Box<dyn ArchiveStore>, Entries), EmbedError> {
        let store: Box<dyn ArchiveStore> = match self {
            Self::InPlace => Box::new(InPlaceStore::new(path)),
            Self::CopyOut => Box::new(CopyOutStore::new(path)?),
        };
        let entries = read_file(store.working_path())?;
        Ok((store, entries))
    }
}

/// Durable storage for one archive on the host filesystem.
pub trait ArchiveStore {
    fn strategy(&self) -> ArchiveStrategy;
    /// The archive the caller asked for.
    fn original_path(&self) -> &Path;
    /// The file entries are read from.
    fn working_path(&self) -> &Path;
    /// Replace the original with `entries`. Must be durable on return.
    fn commit(&mut self, entries: &Entries) -> Result<(), EmbedError>;
}

// ── In-place ─────────────────────────────────────────────────────────────────

pub struct InPlaceStore {
    path: PathBuf,
}

impl InPlaceStore {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ArchiveStore for InPlaceStore {
    fn strategy(&self) -> ArchiveStrategy {
        ArchiveStrategy::InPlace
    }

    fn original_path(&self) -> &Path {
        &self.path
    }

    fn working_path(&self) -> &Path {
        &self.path
    }

    fn commit(&mut self, entries: &Entries) -> Result<(), EmbedError> {
        let dir = parent_dir(&self.path);
        let tmp = NamedTempFile::new_in(dir).map_err(|e| {
            EmbedError::archive_io(format!("cannot create temporary file in {}", dir.display()), e)
        })?;
        write_synced(tmp.as_file(), entries, &self.path)?;
        copy_permissions(&self.path, tmp.path())?;
        tmp.persist(&self.path).map_err(|e| {
            EmbedError::archive_io(format!("cannot replace {}", self.path.display()), e.error)
        })?;
        sync_dir(dir);
        debug!(path = %self.path.display(), "Committed archive in place");
        Ok(())
    }
}

// ── Copy-out ─────────────────────────────────────────────────────────────────

pub struct CopyOutStore {
    original: PathBuf,
    working: PathBuf,
    // Removed on drop, on every exit path.
    _scratch: TempDir,
}

impl CopyOutStore {
    /// Copy `path` into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ArchiveIo`] if the copy fails.
    pub fn new(path: &Path) -> Result<Self, EmbedError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| EmbedError::archive_io("cannot create temporary directory", e))?;
        let name = path.file_name().map_or_else(|| "archive.zip".into(), ToOwned::to_owned);
        let working = scratch.path().join(name);
        fs::copy(path, &working).map_err(|e| {
            EmbedError::archive_io(format!("cannot copy {} to temporary storage", path.display()), e)
        })?;
        debug!(original = %path.display(), working = %working.display(), "Copied archive out");
        Ok(Self {
            original: path.to_path_buf(),
            working,
            _scratch: scratch,
        })
    }
}

impl ArchiveStore for CopyOutStore {
    fn strategy(&self) -> ArchiveStrategy {
        ArchiveStrategy::CopyOut
    }

    fn original_path(&self) -> &Path {
        &self.original
    }

    fn working_path(&self) -> &Path {
        &self.working
    }

    fn commit(&mut self, entries: &Entries) -> Result<(), EmbedError> {
        let file = File::create(&self.working).map_err(|e| {
            EmbedError::archive_io(format!("cannot write {}", self.working.display()), e)
        })?;
        write_synced(&file, entries, &self.original)?;
        drop(file);

        if let Err(e) = fs::rename(&self.working, &self.original) {
            debug!(error = %e, "Cannot rename copy over the original");
            move_into_place(&self.working, &self.original)?;
        }
        sync_dir(parent_dir(&self.original));
        debug!(path = %self.original.display(), "Committed archive from copy");
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Replace `original` with the content of `working` when they live on
/// different filesystems.
///
/// The content is staged in a temporary file next to `original` and renamed
/// over it. Only when no such file can be created is `original` overwritten
/// directly, which leaves it truncated if the copy then fails.
fn move_into_place(working: &Path, original: &Path) -> Result<(), EmbedError> {
    match stage_beside(working, original) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(
                path = %original.display(),
                error = %e,
                "Cannot stage archive next to the original, overwriting it directly"
            );
            overwrite(working, original)
        }
    }
}

fn stage_beside(working: &Path, original: &Path) -> Result<(), EmbedError> {
    let mut source = File::open(working)
        .map_err(|e| EmbedError::archive_io(format!("cannot read {}", working.display()), e))?;
    let dir = parent_dir(original);
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        EmbedError::archive_io(format!("cannot create temporary file in {}", dir.display()), e)
    })?;
    std::io::copy(&mut source, tmp.as_file_mut())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| EmbedError::archive_io(format!("cannot stage {}", original.display()), e))?;
    copy_permissions(original, tmp.path())?;
    tmp.persist(original).map_err(|e| {
        EmbedError::archive_io(format!("cannot replace {}", original.display()), e.error)
    })?;
    Ok(())
}

fn overwrite(working: &Path, original: &Path) -> Result<(), EmbedError> {
    // Open the source first so a missing copy never truncates the original.
    let mut source = File::open(working)
        .map_err(|e| EmbedError::archive_io(format!("cannot read {}", working.display()), e))?;
    let mut target = File::create(original)
        .map_err(|e| EmbedError::archive_io(format!("cannot replace {}", original.display()), e))?;
    std::io::copy(&mut source, &mut target)
        .and_then(|_| target.sync_all())
        .map_err(|e| EmbedError::archive_io(format!("cannot replace {}", original.display()), e))
}

/// Read all entries of the archive file at `path`.
///
/// # Errors
///
/// Returns [`EmbedError::ArchiveIo`] if the file cannot be opened or parsed.
pub fn read_file(path: &Path) -> Result<Entries, EmbedError> {
    let file = File::open(path)
        .map_err(|e| EmbedError::archive_io(format!("cannot open {}", path.display()), e))?;
    codec::read_entries(BufReader::new(file), &path.display().to_string())
}

/// Create an empty, valid archive at `path`, along with any missing parent
/// directories.
///
/// # Errors
///
/// Returns [`EmbedError::ArchiveIo`] if a directory or the file cannot be
/// written.
pub fn create_empty(path: &Path) -> Result<(), EmbedError> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)
        .map_err(|e| EmbedError::archive_io(format!("cannot create directory {}", dir.display()), e))?;
    let file = File::create(path)
        .map_err(|e| EmbedError::archive_io(format!("cannot create {}", path.display()), e))?;
    write_synced(&file, &Entries::new(), path)
}

fn write_synced(file: &File, entries: &Entries, label: &Path) -> Result<(), EmbedError> {
    let label_text = label.display().to_string();
    let writer = codec::write_entries(BufWriter::new(file), entries, &label_text)?;
    let file = writer
        .into_inner()
        .map_err(|e| EmbedError::archive_io(format!("cannot flush {label_text}"), e.into_error()))?;
    file.sync_all()
        .map_err(|e| EmbedError::archive_io(format!("cannot sync {label_text}"), e))
}

fn copy_permissions(from: &Path, to: &Path) -> Result<(), EmbedError> {
    let permissions = fs::metadata(from)
        .map_err(|e| EmbedError::archive_io(format!("cannot stat {}", from.display()), e))?
        .permissions();
    fs::set_permissions(to, permissions)
        .map_err(|e| EmbedError::archive_io(format!("cannot set permissions on {}", to.display()), e))
}

pub(super) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Persist a rename by syncing the directory. Not supported everywhere, so
/// failures are only logged.
fn sync_dir(dir: &Path) {
    if cfg!(unix)
        && let Err(e) = File::open(dir).and_then(|d| d.sync_all())
    {
        debug!(dir = %dir.display(), error = %e, "Directory sync failed");
    }
}
