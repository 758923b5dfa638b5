//! Application service — merging agent archives into the primary archive.
//!
//! Existing entries of the primary are never overwritten, so the primary's
//! own `META-INF/MANIFEST.MF` survives every merge.

use serde::Serialize;
use tracing::debug;

use crate::application::ports::ArchiveFs;
use crate::domain::archive::{alternate_form, file_name, normalize_entry_path};
use crate::domain::error::EmbedError;

/// Entry counts of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub copied: usize,
    pub skipped: usize,
}

/// Copy every entry of `source` whose path, as file or as directory, is not
/// yet present in `primary`.
///
/// # Errors
///
/// [`EmbedError::ArchiveIo`] naming the first entry that cannot be copied.
/// Entries copied before the failure stay in `primary`.
pub fn merge_into<P, S>(primary: &mut P, source: &S) -> Result<MergeStats, EmbedError>
where
    P: ArchiveFs,
    S: ArchiveFs,
{
    let mut stats = MergeStats::default();
    for name in source.entry_names() {
        if primary.contains(&name) || primary.contains(&alternate_form(&name)) {
            stats.skipped += 1;
            continue;
        }
        let entry = source.entry(&name).cloned().ok_or_else(|| {
            EmbedError::archive_io(format!("cannot unpack '{name}'"), "entry disappeared from agent archive")
        })?;
        debug!(entry = %name, "Unpacking");
        primary
            .put(&name, entry)
            .map_err(|e| EmbedError::archive_io(format!("cannot unpack '{name}'"), e))?;
        stats.copied += 1;
    }
    Ok(stats)
}

/// Find a nested copy of an agent archive inside `primary`: the exact
/// `expected` path first, then the first file entry with the same file name.
#[must_use]
pub fn locate_embedded_copy(primary: &impl ArchiveFs, expected: &str) -> Option<String> {
    let expected = normalize_entry_path(expected);
    if expected.is_empty() {
        return None;
    }
    if primary.entry(&expected).is_some_and(|e| !e.directory) {
        return Some(expected);
    }
    let wanted = file_name(&expected);
    primary
        .entry_names()
        .into_iter()
        .find(|name| !name.ends_with('/') && file_name(name) == wanted)
}

/// Delete a nested agent archive. Returns `false` if there was nothing to
/// delete.
pub fn remove_embedded_copy(primary: &mut impl ArchiveFs, path: &str) -> bool {
    primary.remove(path)
}
