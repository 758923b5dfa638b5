//! Application service — reading and writing archive manifests.

use agent_launcher::{MANIFEST_PATH, Manifest};
use anyhow::Result;

use crate::application::ports::ArchiveFs;
use crate::domain::archive::ArchiveEntry;
use crate::domain::error::EmbedError;
use crate::domain::manifest::parse_runnable;

/// Load the manifest of the primary archive and require a `Main-Class`.
///
/// # Errors
///
/// [`EmbedError::NotRunnable`] when the archive is not a runnable bundle.
pub fn load_runnable_manifest(archive: &impl ArchiveFs) -> Result<Manifest, EmbedError> {
    parse_runnable(archive.entry(MANIFEST_PATH).map(|e| e.data.as_slice()))
}

/// Load an archive's manifest, if it has one.
///
/// # Errors
///
/// [`EmbedError::ArchiveIo`] when the manifest exists but cannot be parsed.
pub fn load_manifest(archive: &impl ArchiveFs) -> Result<Option<Manifest>, EmbedError> {
    archive
        .entry(MANIFEST_PATH)
        .map(|entry| {
            Manifest::parse(&entry.data)
                .map_err(|e| EmbedError::archive_io(format!("cannot parse {MANIFEST_PATH}"), e))
        })
        .transpose()
}

/// Write `manifest` back into `archive`, replacing the old entry in place
/// and keeping its metadata.
///
/// # Errors
///
/// [`EmbedError::ArchiveIo`] if the entry cannot be written.
pub fn persist(manifest: &Manifest, archive: &mut impl ArchiveFs) -> Result<(), EmbedError> {
    let mut entry = archive
        .entry(MANIFEST_PATH)
        .cloned()
        .unwrap_or_else(|| ArchiveEntry::file(Vec::new()));
    entry.data = manifest.to_bytes();
    archive
        .put(MANIFEST_PATH, entry)
        .map_err(|e| EmbedError::archive_io(format!("cannot write {MANIFEST_PATH}"), e))
}
