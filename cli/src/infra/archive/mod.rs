//! Zip-backed archive access layer.
//!
//! An [`Archive`] holds all entries of one zip container in memory, in
//! container order. Host archives are backed by an [`ArchiveStore`] chosen
//! by [`HostArchiveOpener`]; archives nested inside another archive are
//! detached copies written back through [`ArchiveFs::close_nested`].
//! Nothing reaches the disk until a modified host archive is closed.

pub mod codec;
pub mod opener;
pub mod store;

use std::io::Cursor;

use anyhow::Result;
use tracing::debug;

pub use opener::HostArchiveOpener;
pub use store::{ArchiveStore, ArchiveStrategy};

use crate::application::ports::ArchiveFs;
use crate::domain::archive::{ArchiveEntry, is_valid_entry_path};
use crate::domain::error::EmbedError;
use codec::Entries;

enum Backing {
    Host(Box<dyn ArchiveStore>),
    Nested { entry: String },
}

/// An open archive.
pub struct Archive {
    label: String,
    entries: Entries,
    modified: bool,
    backing: Backing,
}

impl Archive {
    pub(crate) fn from_store(store: Box<dyn ArchiveStore>, entries: Entries) -> Self {
        Self {
            label: store.original_path().display().to_string(),
            entries,
            modified: false,
            backing: Backing::Host(store),
        }
    }

    /// Host path or `outer!/entry` for nested archives.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Strategy of a host archive; `None` for nested archives.
    #[must_use]
    pub fn strategy(&self) -> Option<ArchiveStrategy> {
        match &self.backing {
            Backing::Host(store) => Some(store.strategy()),
            Backing::Nested { .. } => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EmbedError> {
        codec::write_entries(Cursor::new(Vec::new()), &self.entries, &self.label)
            .map(Cursor::into_inner)
    }
}

impl ArchiveFs for Archive {
    fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn entry(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.get(path)
    }

    fn put(&mut self, path: &str, entry: ArchiveEntry) -> Result<()> {
        if !is_valid_entry_path(path) {
            return Err(EmbedError::archive_io(
                format!("cannot add '{path}' to {}", self.label),
                "not a relative entry path",
            )
            .into());
        }
        let name = if entry.directory && !path.ends_with('/') {
            format!("{path}/")
        } else {
            path.to_string()
        };
        self.entries.insert(name, entry);
        self.modified = true;
        Ok(())
    }

    fn remove(&mut self, path: &str) -> bool {
        let removed = self.entries.shift_remove(path).is_some();
        self.modified |= removed;
        removed
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn open_nested(&self, path: &str) -> Result<Option<Self>> {
        let Some(entry) = self.entries.get(path).filter(|e| !e.directory) else {
            return Ok(None);
        };
        let label = format!("{}!/{path}", self.label);
        let entries = codec::read_entries(Cursor::new(entry.data.as_slice()), &label)?;
        debug!(archive = %label, entries = entries.len(), "Opened nested archive");
        Ok(Some(Self {
            label,
            entries,
            modified: false,
            backing: Backing::Nested {
                entry: path.to_string(),
            },
        }))
    }

    fn close_nested(&mut self, nested: Self) -> Result<()> {
        let Backing::Nested { entry } = &nested.backing else {
            return Err(EmbedError::archive_io(
                format!("cannot close {} through {}", nested.label, self.label),
                "not a nested archive",
            )
            .into());
        };
        if !nested.modified {
            return Ok(());
        }
        let data = nested.to_bytes()?;
        let mut updated = self
            .entries
            .get(entry)
            .cloned()
            .unwrap_or_else(|| ArchiveEntry::file(Vec::new()));
        updated.data = data;
        self.put(entry, updated)
    }

    fn close(self) -> Result<()> {
        match self.backing {
            Backing::Host(mut store) => {
                if self.modified {
                    store.commit(&self.entries)?;
                } else {
                    debug!(archive = %self.label, "Closed unmodified archive");
                }
                Ok(())
            }
            Backing::Nested { .. } if self.modified => Err(EmbedError::archive_io(
                format!("cannot close {}", self.label),
                "a modified nested archive must be closed through its parent",
            )
            .into()),
            Backing::Nested { .. } => Ok(()),
        }
    }

    fn discard(self) {
        debug!(archive = %self.label, modified = self.modified, "Discarded archive");
    }
}
